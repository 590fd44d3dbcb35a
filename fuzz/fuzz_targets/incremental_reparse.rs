#![no_main]

use libfuzzer_sys::fuzz_target;
use weft_syntax::bracket::BracketGrammar;
use weft_syntax::{parse, reparse, Edit, SyntaxConfig};

const MAX_SOURCE_BYTES: usize = 4096;

fn decode_source(bytes: &[u8]) -> String {
    let capped = &bytes[..bytes.len().min(MAX_SOURCE_BYTES)];
    String::from_utf8_lossy(capped).into_owned()
}

fn floor_boundary(text: &str, mut pos: usize) -> usize {
    pos = pos.min(text.len());
    while !text.is_char_boundary(pos) {
        pos -= 1;
    }
    pos
}

fuzz_target!(|data: &[u8]| {
    if data.len() < 4 {
        return;
    }

    let config = SyntaxConfig {
        max_buffer_length: 8,
        branch_factor: 4,
        max_chunk_tokens: 4,
        margin_before: 2,
        margin_after: 2,
        ..SyntaxConfig::default()
    };
    let source = decode_source(&data[4..]);

    let split_a = floor_boundary(&source, usize::from(data[0]) % (source.len() + 1));
    let split_b = floor_boundary(&source, usize::from(data[1]) % (source.len() + 1));
    let (from, to) = (split_a.min(split_b), split_a.max(split_b));
    let inserted = match data[2] % 4 {
        0 => "",
        1 => "{",
        2 => "} (",
        _ => "\"/*x",
    };
    let inserted = &inserted[..usize::from(data[3]) % (inserted.len() + 1)];

    let mut next = String::with_capacity(source.len() + inserted.len());
    next.push_str(&source[..from]);
    next.push_str(inserted);
    next.push_str(&source[to..]);

    let grammar = BracketGrammar::new();
    let first = parse(&grammar, source.as_str(), &config).expect("fresh parse");
    assert_eq!(first.tree.len() as usize, source.len());

    let edit = Edit::replace(from as u32, to as u32, inserted.len() as u32);
    let second = reparse(&grammar, next.as_str(), &config, first.cache, &[edit]).expect("reparse");
    let fresh = parse(&grammar, next.as_str(), &config).expect("fresh parse");
    assert_eq!(second.tree.preorder(), fresh.tree.preorder());
    second.cache.buffer().check_invariants();
});
