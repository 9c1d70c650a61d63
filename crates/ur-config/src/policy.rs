//! Placement driven by `[[placement.rule]]` entries.

use crate::config::{PlacementRule, RuleKind};
use tracing::trace;
use ur_convert::{FunctionSignature, Placement, PlacementPolicy};

/// First-match-wins rule table with an optional fallback buffer.
#[derive(Debug, Clone, Default)]
pub struct RulePolicy {
    default_buffer: Option<String>,
    rules: Vec<PlacementRule>,
}

impl RulePolicy {
    pub fn new(default_buffer: Option<String>, rules: Vec<PlacementRule>) -> Self {
        Self {
            default_buffer: default_buffer.filter(|b| !b.is_empty()),
            rules,
        }
    }

    fn place(&self, kind: RuleKind, name: &str, arity: Option<usize>) -> Option<Placement> {
        let Some(rule) = self.rules.iter().find(|r| matches(r, kind, name, arity)) else {
            return self.default_buffer.as_deref().map(Placement::to);
        };
        trace!("{:?} {} matched {:?}", kind, name, rule);

        if rule.skip {
            return Some(Placement::skip());
        }
        let Some(buffer) = rule.buffer.as_deref().or(self.default_buffer.as_deref()) else {
            return Some(Placement::skip());
        };

        let placement = Placement::to(buffer);
        Some(match &rule.rename {
            Some(rename) => placement.renamed(rename.replace("{name}", name)),
            None => placement,
        })
    }
}

fn matches(rule: &PlacementRule, kind: RuleKind, name: &str, arity: Option<usize>) -> bool {
    if rule.kind != RuleKind::Any && rule.kind != kind {
        return false;
    }

    let named = match (&rule.name, &rule.prefix) {
        (Some(exact), _) => exact == name,
        (None, Some(prefix)) => name.starts_with(prefix.as_str()),
        (None, None) => false,
    };
    if !named {
        return false;
    }

    if rule.min_params.is_none() && rule.max_params.is_none() {
        return true;
    }
    // Bounded rules only ever match functions
    let Some(arity) = arity else {
        return false;
    };
    rule.min_params.map_or(true, |min| arity >= min)
        && rule.max_params.map_or(true, |max| arity <= max)
}

impl PlacementPolicy for RulePolicy {
    fn place_struct(&self, name: &str) -> Option<Placement> {
        self.place(RuleKind::Struct, name, None)
    }

    fn place_enum(&self, name: &str) -> Option<Placement> {
        self.place(RuleKind::Enum, name, None)
    }

    fn place_global(&self, name: &str) -> Option<Placement> {
        self.place(RuleKind::Global, name, None)
    }

    fn place_function(&self, signature: &FunctionSignature) -> Option<Placement> {
        self.place(RuleKind::Function, &signature.name, Some(signature.arity()))
    }
}
