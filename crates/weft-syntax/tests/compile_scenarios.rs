mod common;
use common::*;

use proptest::prelude::*;

#[test]
fn balanced_block_compiles_to_one_reused_chunk() {
    let config = SyntaxConfig::default();
    let buffer = buffer_of(&[lbrace(0), word(1), rbrace(2)], &config);
    assert_eq!(buffer.len(), 1);
    assert!(buffer.chunks()[0].is_pure());

    let mut compiler = Compiler::new(buffer, &config);
    let compiled = compiler.compile(3).unwrap();
    assert_eq!(compiled.records, vec![0, 0, 3, -1]);
    assert_eq!(compiled.reused.len(), 1);

    let tree = compiled.build(NodeKind::DOCUMENT, &config);
    assert_eq!(
        outline(&tree),
        vec![
            (NodeKind::DOCUMENT, 0, 3),
            (BLOCK, 0, 3),
            (WORD, 1, 2),
        ]
    );
}

#[test]
fn unclosed_block_gets_incomplete_marker() {
    let config = SyntaxConfig::default();
    let buffer = buffer_of(&[lbrace(0), word(1)], &config);
    let tree = compile_buffer(buffer, 2, &config);
    assert_eq!(
        outline(&tree),
        vec![
            (NodeKind::DOCUMENT, 0, 2),
            (BLOCK, 0, 2),
            (WORD, 1, 2),
            (NodeKind::INCOMPLETE, 2, 2),
        ]
    );
}

#[test]
fn stray_close_is_dropped() {
    let config = SyntaxConfig::default();
    let buffer = buffer_of(&[word(0), rbrace(1)], &config);
    let mut compiler = Compiler::new(buffer, &config);
    let compiled = compiler.compile(2).unwrap();
    assert_eq!(compiled.records, vec![i32::from(WORD.0), 0, 1, 4]);

    let tree = compiled.build(NodeKind::DOCUMENT, &config);
    assert_eq!(tree.len(), 2);
    assert_eq!(
        outline(&tree),
        vec![(NodeKind::DOCUMENT, 0, 2), (WORD, 0, 1)]
    );
}

#[test]
fn compile_is_repeatable() {
    let config = SyntaxConfig::default();
    let buffer = buffer_of(&[lbrace(0), word(1), lbrace(2), word(3)], &config);
    let mut compiler = Compiler::new(buffer, &config);
    let first = compiler.compile(4).unwrap();
    let second = compiler.compile(4).unwrap();
    assert_eq!(first, second);
    assert_eq!(compiler.stack_depth(), 0);
}

#[test]
fn compiler_steps_once_per_chunk() {
    let config = letters_config();
    let buffer = buffer_of(&[lbrace(0), word(1), word(2), rbrace(3), word(5)], &config);
    let chunks = buffer.len();
    let mut compiler = Compiler::new(buffer, &config);

    let mut steps = 0;
    while compiler.step() {
        steps += 1;
    }
    assert_eq!(steps, chunks);
    assert!(compiler.is_done());
    assert_eq!(compiler.position(), chunks);
    assert_eq!(compiler.stack_depth(), 0);
}

#[test]
fn empty_buffer_has_nothing_to_compile() {
    let config = SyntaxConfig::default();
    let mut compiler = Compiler::new(ChunkBuffer::new(&config), &config);
    assert!(compiler.compile(0).is_none());
    assert_eq!(compile_buffer(ChunkBuffer::new(&config), 5, &config).len(), 5);
}

#[test]
fn length_is_raised_to_the_last_chunk() {
    let config = SyntaxConfig::default();
    let buffer = buffer_of(&[word(0), word(6)], &config);
    let tree = compile_buffer(buffer, 3, &config);
    assert_eq!(tree.len(), 7);
}

fn open_depth(text: &str) -> usize {
    text.chars().fold(0usize, |depth, c| match c {
        '{' => depth + 1,
        '}' => depth.saturating_sub(1),
        _ => depth,
    })
}

proptest! {
    #[test]
    fn every_open_becomes_a_node(text in "[ab{} ]{0,40}") {
        let grammar = LetterGrammar::new();
        for config in [letters_config(), tight_config(), SyntaxConfig::default()] {
            let output = parse(&grammar, text.as_str(), &config).unwrap();
            let nodes = outline(&output.tree);

            let blocks = nodes.iter().filter(|(kind, _, _)| *kind == BLOCK).count();
            let incomplete = nodes
                .iter()
                .filter(|(kind, _, _)| *kind == NodeKind::INCOMPLETE)
                .count();
            prop_assert_eq!(blocks, text.matches('{').count());
            prop_assert_eq!(incomplete, open_depth(&text));
            prop_assert_eq!(output.tree.len() as usize, text.len());
        }
    }

    #[test]
    fn records_are_well_formed(text in "[ab{} ]{0,40}") {
        let grammar = LetterGrammar::new();
        let config = tight_config();
        let output = parse(&grammar, text.as_str(), &config).unwrap();

        let mut compiler = Compiler::new(output.cache.buffer().clone(), &config);
        let Some(first) = compiler.compile(text.len() as u32) else {
            prop_assert!(text.trim().is_empty());
            return Ok(());
        };
        check_postfix(&first.records);
        let second = compiler.compile(text.len() as u32).unwrap();
        prop_assert_eq!(&first, &second);

        // Chunks carry cached trees; a fresh compile of a clone agrees.
        let mut fresh = Compiler::new(output.cache.buffer().clone(), &config);
        prop_assert_eq!(fresh.compile(text.len() as u32).unwrap().records, first.records);
    }
}
