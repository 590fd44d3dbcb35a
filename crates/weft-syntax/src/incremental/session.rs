//! The stateless parse driver.

use tracing::{debug, trace};

use crate::chunk::{Chunk, ChunkBuffer};
use crate::compiler::Compiler;
use crate::config::SyntaxConfig;
use crate::error::{Error, Result};
use crate::incremental::{Edit, Grammar, Input, Match, ParseOutput, ReuseStats, SyntaxCache};
use crate::kind::NodeKind;
use crate::token::GrammarToken;
use crate::tree::Tree;

/// One parse of one document version, advanced a unit of work at a time.
///
/// The session seeds a chunk buffer from a previous [`SyntaxCache`], runs the
/// grammar over the region that could not be reused, splices reusable chunks
/// back in, and finally compiles the buffer one chunk per
/// [`ParseSession::advance`]. Dropping the session at any point cancels it.
pub struct ParseSession<'a, G: ?Sized, I: ?Sized> {
    grammar: &'a G,
    input: &'a I,
    config: SyntaxConfig,
    stop: u32,
    stage: Stage,
    stats: ReuseStats,
}

enum Stage {
    Seed {
        cache: Option<SyntaxCache>,
        edits: Vec<Edit>,
    },
    Tokenize(Tokenizer),
    Compile {
        compiler: Compiler,
        ahead: Vec<ChunkBuffer>,
    },
    Done,
}

struct Tokenizer {
    buffer: ChunkBuffer,
    pos: u32,
    /// Reusable chunk runs past `pos`, in document order.
    ahead: Vec<ChunkBuffer>,
}

impl<'a, G, I> ParseSession<'a, G, I>
where
    G: Grammar + ?Sized,
    I: Input + ?Sized,
{
    /// Creates a session that parses `input` from scratch up to its end.
    pub fn new(grammar: &'a G, input: &'a I, config: &SyntaxConfig) -> Self {
        Self {
            grammar,
            input,
            config: *config,
            stop: input.len(),
            stage: Stage::Seed {
                cache: None,
                edits: Vec::new(),
            },
            stats: ReuseStats::default(),
        }
    }

    /// Reuses the state of a parse of the previous document version. `edits`
    /// turn that version into `input`; they are given in coordinates of the
    /// previous version.
    #[must_use]
    pub fn reuse(mut self, cache: SyntaxCache, edits: &[Edit]) -> Self {
        if let Stage::Seed { .. } = self.stage {
            self.stage = Stage::Seed {
                cache: Some(cache),
                edits: edits.to_vec(),
            };
        }
        self
    }

    /// Stops tokenizing at `stop` instead of the end of the document. Chunks
    /// past `stop` that could still be reused are kept in the cache.
    pub fn stop_at(mut self, stop: u32) -> Result<Self> {
        let length = self.input.len();
        if stop > length {
            return Err(Error::BeyondDocument {
                position: stop,
                length,
            });
        }
        self.stop = stop;
        Ok(self)
    }

    /// The position tokenizing has reached.
    #[must_use]
    pub fn position(&self) -> u32 {
        match &self.stage {
            Stage::Seed { .. } => 0,
            Stage::Tokenize(tokenizer) => tokenizer.pos,
            Stage::Compile { .. } | Stage::Done => self.stop,
        }
    }

    /// Does one unit of work: seeding, one grammar match or splice, or one
    /// compiled chunk. Returns the output once the parse is complete.
    pub fn advance(&mut self) -> Result<Option<ParseOutput>> {
        match std::mem::replace(&mut self.stage, Stage::Done) {
            Stage::Seed { cache, edits } => {
                let tokenizer = self.seed(cache, &edits)?;
                self.stage = Stage::Tokenize(tokenizer);
            }
            Stage::Tokenize(mut tokenizer) => {
                self.stage = if self.tokenize(&mut tokenizer)? {
                    Stage::Tokenize(tokenizer)
                } else {
                    Stage::Compile {
                        compiler: Compiler::new(tokenizer.buffer, &self.config),
                        ahead: tokenizer.ahead,
                    }
                };
            }
            Stage::Compile {
                mut compiler,
                ahead,
            } => {
                if compiler.step() {
                    self.stage = Stage::Compile { compiler, ahead };
                } else {
                    return Ok(Some(self.complete(compiler, ahead)));
                }
            }
            Stage::Done => return Err(Error::SessionFinished),
        }
        Ok(None)
    }

    /// Runs the session to completion.
    pub fn finish(mut self) -> Result<ParseOutput> {
        loop {
            if let Some(output) = self.advance()? {
                return Ok(output);
            }
        }
    }

    fn seed(&mut self, cache: Option<SyntaxCache>, edits: &[Edit]) -> Result<Tokenizer> {
        let length = self.input.len();
        let Some(cache) = cache else {
            debug!("Parsing {length} bytes from scratch");
            return Ok(Tokenizer {
                buffer: ChunkBuffer::new(&self.config),
                pos: 0,
                ahead: Vec::new(),
            });
        };

        let edit = Edit::merge(edits);
        validate(&cache, edits, edit, length)?;

        let SyntaxCache { buffer, ahead, .. } = cache;
        let mut segments = Vec::new();
        let mut kept = match edit {
            Some(edit) => {
                let behind = edit.from.saturating_sub(self.config.margin_before);
                let after = edit.to.saturating_add(self.config.margin_after);
                let (kept, rest) = cut(buffer, behind, after, edit.offset, &self.config)?;
                segments.extend(rest);
                for segment in ahead {
                    segments.extend(relocate(segment, behind, after, edit.offset)?);
                }
                kept
            }
            None => {
                segments = ahead;
                buffer
            }
        };

        // Resume only at a clean match end inside the requested range.
        if kept.to() > self.stop || kept.last().is_some_and(|chunk| !chunk.is_settled()) {
            let pos = kept.to().min(self.stop);
            let (head, rest) = cut(kept, pos, pos, 0, &self.config)?;
            segments.extend(rest);
            kept = head;
        }

        let pos = kept.to();
        segments.sort_by_key(ChunkBuffer::from);
        let mut ahead = Vec::with_capacity(segments.len());
        for mut segment in segments {
            if segment.is_empty() {
                continue;
            }
            if segment.from() < pos {
                let Some((_, index)) = segment.find_ahead_split_point(pos) else {
                    continue;
                };
                segment.slide(index, 0, true)?;
            }
            ahead.push(segment);
        }

        self.stats.chunks_behind = kept.len();
        debug!(
            "Reusing {} chunks up to {pos}, {} segments ahead",
            kept.len(),
            ahead.len()
        );
        Ok(Tokenizer {
            buffer: kept,
            pos,
            ahead,
        })
    }

    /// Returns `false` once tokenizing is complete.
    fn tokenize(&mut self, tokenizer: &mut Tokenizer) -> Result<bool> {
        if tokenizer.pos >= self.stop {
            return Ok(false);
        }
        if self.splice(tokenizer)? {
            return Ok(true);
        }

        let pos = tokenizer.pos;
        let length = self.input.len();
        let found = self.match_at(tokenizer.buffer.scopes(), pos, length);
        self.stats.matches += 1;
        match found {
            Some(found) => {
                let end = pos.saturating_add(found.len()).min(length);
                trace!("Matched {pos}..{end}");
                tokenizer.buffer.add_match(&found.compile(), end);
                tokenizer.pos = end;
            }
            None => {
                let width = self
                    .input
                    .chunk(pos)
                    .chars()
                    .next()
                    .map_or(1, char::len_utf8);
                let end = pos + u32::try_from(width).unwrap_or(1);
                trace!("Unrecognized input at {pos}..{end}");
                tokenizer
                    .buffer
                    .add_match(&[GrammarToken::unrecognized(pos, end)], end);
                tokenizer.pos = end;
                self.stats.unrecognized += 1;
            }
        }
        Ok(true)
    }

    /// Runs the matcher at `pos`. A match reaching the end of a window that
    /// stops short of the document may have been cut off, so the window is
    /// doubled and the match retried.
    fn match_at(&self, scopes: &[NodeKind], pos: u32, length: u32) -> Option<Match> {
        let start = self
            .input
            .floor_boundary(pos.saturating_sub(self.config.margin_before));
        let at = (pos - start) as usize;
        let mut window_length = self.config.window_length;
        loop {
            let end = self
                .input
                .floor_boundary(pos.saturating_add(window_length).min(length));
            let window = self.input.read(start, end);
            let found = self
                .grammar
                .match_token(scopes, &window, at, start)
                .filter(|found| !found.is_empty());
            let cut_off = end < length
                && found
                    .as_ref()
                    .map_or(end <= pos, |found| pos.saturating_add(found.len()) >= end);
            if !cut_off {
                return found;
            }
            window_length = window_length.saturating_mul(2);
            trace!("Match at {pos} reached the window end {end}, widening to {window_length}");
        }
    }

    /// Splices the next ahead segment onto the buffer if tokenizing reached
    /// its start in the same scope state. Chunks past the last match end
    /// before the stop position stay behind for a later parse.
    fn splice(&mut self, tokenizer: &mut Tokenizer) -> Result<bool> {
        let pos = tokenizer.pos;

        // Drop candidates that tokenizing has already passed.
        loop {
            let Some(segment) = tokenizer.ahead.first_mut() else {
                return Ok(false);
            };
            if !segment.is_empty() && segment.from() >= pos {
                break;
            }
            let next = if segment.is_empty() {
                None
            } else {
                segment.find_ahead_split_point(pos).map(|(_, index)| index)
            };
            match next {
                Some(index) => segment.slide(index, 0, true)?,
                None => {
                    tokenizer.ahead.remove(0);
                }
            }
        }

        let segment = &mut tokenizer.ahead[0];
        if segment.from() != pos {
            return Ok(false);
        }
        if segment.chunks()[0].scopes() != tokenizer.buffer.scopes() {
            // The leading pure run and the unpure chunk ending it share one
            // snapshot; none of them can match.
            let skip = segment
                .find_next_unpure_chunk(0)
                .unwrap_or(segment.len());
            match segment.next_ahead_candidate(skip + 1) {
                Some(index) => segment.slide(index, 0, true)?,
                None => {
                    tokenizer.ahead.remove(0);
                }
            }
            return Ok(false);
        }

        // Keep chunks up to the last match end at or before the stop, so that
        // tokenizing never resumes inside a match.
        let fits = segment
            .chunks()
            .iter()
            .position(|chunk| chunk.to() > self.stop)
            .unwrap_or(segment.len());
        let keep = segment.chunks()[..fits]
            .iter()
            .rposition(Chunk::is_settled)
            .map_or(0, |index| index + 1);
        if keep == 0 {
            return Ok(false);
        }

        let segment = tokenizer.ahead.remove(0);
        let (head, rest) = if keep == segment.len() {
            (segment, None)
        } else {
            let (head, rest) = segment.split(keep)?;
            (head, Some(rest))
        };

        let spliced = head.len();
        tokenizer.buffer.append(head, None);
        self.stats.chunks_ahead += spliced;
        tokenizer.pos = tokenizer.buffer.to();
        debug!("Spliced {spliced} chunks at {pos}, resuming at {}", tokenizer.pos);

        if let Some(rest) = rest {
            tokenizer.ahead.insert(0, rest);
        }
        Ok(true)
    }

    fn complete(&mut self, mut compiler: Compiler, ahead: Vec<ChunkBuffer>) -> ParseOutput {
        let tree = match compiler.compile(self.stop) {
            Some(compiled) => {
                self.stats.chunk_trees = compiled.reused.len();
                compiled.build(NodeKind::DOCUMENT, &self.config)
            }
            None => Tree::empty(NodeKind::DOCUMENT, self.stop),
        };
        let buffer = compiler.into_buffer();
        debug!(
            "Parsed {} bytes into {} chunks ({} matches, {} chunk trees)",
            tree.len(),
            buffer.len(),
            self.stats.matches,
            self.stats.chunk_trees
        );
        ParseOutput {
            tree,
            cache: SyntaxCache {
                buffer,
                ahead,
                length: self.input.len(),
            },
            stats: self.stats,
        }
    }
}

fn validate(cache: &SyntaxCache, edits: &[Edit], merged: Option<Edit>, length: u32) -> Result<()> {
    for edit in edits.iter().chain(merged.as_ref()) {
        if edit.from > edit.to || edit.to > cache.length {
            return Err(Error::InvalidEdit {
                from: edit.from,
                to: edit.to,
                length: cache.length,
            });
        }
    }
    let offset = merged.map_or(0, |edit| i64::from(edit.offset));
    if i64::from(cache.length) + offset != i64::from(length) {
        return Err(Error::LengthMismatch {
            cached: cache.length,
            offset,
            actual: length,
        });
    }
    Ok(())
}

/// Splits `buffer` around a dirty range. Keeps the chunks up to the last
/// restart point ending at or before `behind`, and returns the chunks from the
/// first splice candidate starting at or after `after`, moved by `offset`.
fn cut(
    buffer: ChunkBuffer,
    behind: u32,
    after: u32,
    offset: i32,
    config: &SyntaxConfig,
) -> Result<(ChunkBuffer, Option<ChunkBuffer>)> {
    let keep = buffer
        .find_behind_split_point(behind)
        .map_or(0, |(_, index)| index + 1);
    let candidate = buffer
        .find_ahead_split_point(after)
        .map(|(_, index)| index);

    let (kept, mut rest) = if keep == 0 {
        (ChunkBuffer::new(config), buffer)
    } else {
        buffer.split(keep)?
    };
    let Some(index) = candidate.and_then(|candidate| candidate.checked_sub(keep)) else {
        return Ok((kept, None));
    };
    if index >= rest.len() {
        return Ok((kept, None));
    }
    rest.slide(index, offset, true)?;
    Ok((kept, Some(rest)))
}

/// Moves a saved segment past an edit. Segments entirely in front of the
/// edit stay where they are; others keep only the chunks from the first
/// candidate past the edit.
fn relocate(segment: ChunkBuffer, behind: u32, after: u32, offset: i32) -> Result<Option<ChunkBuffer>> {
    if segment.to() <= behind {
        return Ok(Some(segment));
    }
    let Some((_, index)) = segment.find_ahead_split_point(after) else {
        return Ok(None);
    };
    let mut segment = segment;
    segment.slide(index, offset, true)?;
    Ok(Some(segment))
}
