//! The stateful parse driver.

use std::sync::Arc;

use tracing::debug;

use crate::config::SyntaxConfig;
use crate::error::Result;
use crate::incremental::{Edit, Grammar, Input, ParseOutput, ParseSession, ReuseStats, SyntaxCache};
use crate::tree::Tree;

/// Keeps the state of the last parse of one document and reuses it for the
/// next.
#[derive(Debug)]
pub struct IncrementalParser<G> {
    grammar: G,
    config: SyntaxConfig,
    cache: Option<SyntaxCache>,
    tree: Option<Arc<Tree>>,
    stats: ReuseStats,
}

impl<G: Grammar> IncrementalParser<G> {
    /// Creates a parser with no previous state.
    pub fn new(grammar: G, config: SyntaxConfig) -> Self {
        Self {
            grammar,
            config,
            cache: None,
            tree: None,
            stats: ReuseStats::default(),
        }
    }

    /// The grammar.
    pub fn grammar(&self) -> &G {
        &self.grammar
    }

    /// The configuration.
    pub fn config(&self) -> &SyntaxConfig {
        &self.config
    }

    /// The tree of the last successful parse.
    pub fn tree(&self) -> Option<&Arc<Tree>> {
        self.tree.as_ref()
    }

    /// The state kept for the next parse.
    pub fn cache(&self) -> Option<&SyntaxCache> {
        self.cache.as_ref()
    }

    /// Reuse counters of the last parse.
    pub fn stats(&self) -> ReuseStats {
        self.stats
    }

    /// Forgets all state; the next parse starts from scratch.
    pub fn reset(&mut self) {
        self.cache = None;
        self.tree = None;
    }

    /// Parses the current version of the document. `edits` turn the version
    /// seen by the previous call into `input` and are ignored on the first
    /// call. With `stop_at`, tokenizing stops there and the chunks beyond are
    /// saved for a later call.
    ///
    /// On error the previous state is dropped, so the next call parses from
    /// scratch.
    pub fn parse<I>(&mut self, input: &I, edits: &[Edit], stop_at: Option<u32>) -> Result<Arc<Tree>>
    where
        I: Input + ?Sized,
    {
        let mut session = ParseSession::new(&self.grammar, input, &self.config);
        if let Some(cache) = self.cache.take() {
            session = session.reuse(cache, edits);
        }
        if let Some(stop) = stop_at {
            session = match session.stop_at(stop) {
                Ok(session) => session,
                Err(err) => {
                    self.tree = None;
                    return Err(err);
                }
            };
        }

        let ParseOutput { tree, cache, stats } = match session.finish() {
            Ok(output) => output,
            Err(err) => {
                debug!("Incremental parse failed, dropping cached state: {err}");
                self.tree = None;
                return Err(err);
            }
        };
        self.cache = Some(cache);
        self.tree = Some(Arc::clone(&tree));
        self.stats = stats;
        Ok(tree)
    }
}
