//! # Search Engine
//!
//! Free-text matching over concept names, optionally narrowed by one
//! structural filter (`memberOf` or `answerTo`).
//!
//! ## Matching
//!
//! Case-insensitive word prefix: every query word must be the prefix of some
//! word of a single name written in the caller's language. A blank query
//! matches every name.
//!
//! ## Ordering
//!
//! 1. exact name match
//! 2. name starting with the query
//! 3. any other match
//!
//! Ties break on the case-folded display name, then the UUID, so identical
//! data always yields identical positions.

use crate::primitives::MAX_QUERY_LENGTH;
use crate::store::{ConceptStore, fold_name};
use crate::{Concept, ConceptId, LexisError, RequestContext};
use std::collections::BTreeSet;
use uuid::Uuid;

/// Structural restriction applied before text matching. At most one per call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchFilter {
    #[default]
    None,
    /// Only set members of this concept.
    MemberOf(ConceptId),
    /// Only registered answers of this concept.
    AnswerTo(ConceptId),
}

impl SearchFilter {
    /// Build a filter from the raw `memberOf` / `answerTo` parameters.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` when both are given or one is not a UUID.
    pub fn from_params(
        member_of: Option<&str>,
        answer_to: Option<&str>,
    ) -> Result<Self, LexisError> {
        let member_of = member_of.map(str::trim).filter(|s| !s.is_empty());
        let answer_to = answer_to.map(str::trim).filter(|s| !s.is_empty());
        match (member_of, answer_to) {
            (Some(_), Some(_)) => Err(LexisError::InvalidArgument(
                "memberOf and answerTo cannot be combined".to_string(),
            )),
            (Some(raw), None) => Ok(Self::MemberOf(parse_filter_uuid("memberOf", raw)?)),
            (None, Some(raw)) => Ok(Self::AnswerTo(parse_filter_uuid("answerTo", raw)?)),
            (None, None) => Ok(Self::None),
        }
    }
}

fn parse_filter_uuid(param: &str, raw: &str) -> Result<ConceptId, LexisError> {
    Uuid::try_parse(raw).map(ConceptId).map_err(|_| {
        LexisError::InvalidArgument(format!("{} must be a concept uuid, got '{}'", param, raw))
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SearchOptions {
    pub include_retired: bool,
}

/// How well a concept matched. Lower sorts first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MatchRank {
    Exact,
    Prefix,
    Word,
}

/// Split text into lowercase alphanumeric words.
fn words(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect()
}

/// A prepared query: folded text plus its words.
#[derive(Debug, Clone)]
struct Query {
    folded: String,
    words: Vec<String>,
}

impl Query {
    fn new(text: &str) -> Self {
        Self {
            folded: fold_name(text),
            words: words(text),
        }
    }

    fn rank(&self, name: &str) -> Option<MatchRank> {
        let name_words = words(name);
        let all_match = self
            .words
            .iter()
            .all(|q| name_words.iter().any(|w| w.starts_with(q.as_str())));
        if !all_match {
            return None;
        }

        let folded = fold_name(name);
        if folded == self.folded {
            Some(MatchRank::Exact)
        } else if folded.starts_with(&self.folded) {
            Some(MatchRank::Prefix)
        } else {
            Some(MatchRank::Word)
        }
    }
}

/// Executes searches against a store. Stateless.
#[derive(Debug, Clone, Copy, Default)]
pub struct SearchEngine;

impl SearchEngine {
    /// Run a search and return matching concepts in rank order.
    ///
    /// Nothing matching, or a filter naming an unknown concept, gives an
    /// empty result.
    pub fn search(
        &self,
        store: &impl ConceptStore,
        ctx: &RequestContext,
        query: &str,
        filter: SearchFilter,
        options: SearchOptions,
    ) -> Result<Vec<Concept>, LexisError> {
        if query.chars().count() > MAX_QUERY_LENGTH {
            return Err(LexisError::InvalidArgument(format!(
                "query exceeds {} characters",
                MAX_QUERY_LENGTH
            )));
        }
        let query = Query::new(query);

        let candidates = match filter {
            SearchFilter::None => store.list_all(options.include_retired)?,
            SearchFilter::MemberOf(owner) => store.find_set_members(owner)?,
            SearchFilter::AnswerTo(owner) => store.find_answers(owner)?,
        };

        let mut seen: BTreeSet<ConceptId> = BTreeSet::new();
        let mut hits: Vec<(MatchRank, String, Concept)> = Vec::new();
        for concept in candidates {
            if (concept.retired && !options.include_retired) || !seen.insert(concept.id) {
                continue;
            }
            let best = concept
                .names
                .iter()
                .filter(|n| n.locale.same_language(&ctx.locale))
                .filter_map(|n| query.rank(&n.name))
                .min();
            if let Some(rank) = best {
                let display = fold_name(concept.display(&ctx.locale));
                hits.push((rank, display, concept));
            }
        }

        hits.sort_by(|a, b| (a.0, &a.1, a.2.id).cmp(&(b.0, &b.1, b.2.id)));
        tracing::debug!(query = %query.folded, ?filter, hits = hits.len(), "search executed");
        Ok(hits.into_iter().map(|(_, _, concept)| concept).collect())
    }
}

// =============================================================================
// TESTS
// =============================================================================
