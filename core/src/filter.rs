//! Per-field character filtering.
//!
//! Each [`FieldKind`] maps to an ordered chain of [`CharValidator`]s. A
//! candidate character is kept only when every validator in the chain accepts
//! it; validators never reorder or merge characters.
//!
//! Chains are built fresh for every edit from the buffer text as it is at that
//! moment, so stateful validators (the dot counter) never see stale text.

use crate::field_kind::FieldKind;

/// Information a validator gets about the character under test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CharContext {
    /// Start of the replaced range in the buffer (chars)
    pub replace_start: usize,
    /// Length of the replaced range (chars)
    pub replace_count: usize,
    /// The candidate character
    pub ch: char,
    /// How many characters of this candidate were accepted before this one
    pub accepted_before: usize,
}

impl CharContext {
    /// Absolute buffer position the character would land on.
    pub fn landing_position(&self) -> usize {
        self.replace_start + self.accepted_before
    }
}

/// A single rule in a filter chain.
pub trait CharValidator {
    /// Return true to keep the character.
    fn accept(&mut self, ctx: &CharContext) -> bool;

    /// Short name for logging.
    fn name(&self) -> &'static str;
}

/// Only ASCII digits.
#[derive(Debug, Clone, Copy, Default)]
pub struct DigitValidator;

impl CharValidator for DigitValidator {
    fn accept(&mut self, ctx: &CharContext) -> bool {
        ctx.ch.is_ascii_digit()
    }

    fn name(&self) -> &'static str {
        "digit"
    }
}

/// Digits, `.`, `+` and `-`.
#[derive(Debug, Clone, Copy, Default)]
pub struct FloatSymbolValidator;

impl CharValidator for FloatSymbolValidator {
    fn accept(&mut self, ctx: &CharContext) -> bool {
        ctx.ch.is_ascii_digit() || matches!(ctx.ch, '.' | '+' | '-')
    }

    fn name(&self) -> &'static str {
        "float-symbol"
    }
}

/// Digits and `.`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DigitOrDotValidator;

impl CharValidator for DigitOrDotValidator {
    fn accept(&mut self, ctx: &CharContext) -> bool {
        ctx.ch.is_ascii_digit() || ctx.ch == '.'
    }

    fn name(&self) -> &'static str {
        "digit-or-dot"
    }
}

/// A sign is only valid as the first character of the buffer.
#[derive(Debug, Clone, Copy, Default)]
pub struct SignPositionValidator;

impl CharValidator for SignPositionValidator {
    fn accept(&mut self, ctx: &CharContext) -> bool {
        if matches!(ctx.ch, '+' | '-') {
            ctx.landing_position() == 0
        } else {
            true
        }
    }

    fn name(&self) -> &'static str {
        "sign-position"
    }
}

/// Allows at most one `.` across the whole buffer.
#[derive(Debug, Clone, Copy)]
pub struct SingleDotValidator {
    dots_left: usize,
}

impl SingleDotValidator {
    /// Build from the current buffer text; existing dots use up the allowance.
    pub fn new(current_text: &str) -> Self {
        let existing = current_text.chars().filter(|&c| c == '.').count();
        Self {
            dots_left: 1usize.saturating_sub(existing),
        }
    }

    pub fn dots_left(&self) -> usize {
        self.dots_left
    }
}

impl CharValidator for SingleDotValidator {
    fn accept(&mut self, ctx: &CharContext) -> bool {
        if ctx.ch != '.' {
            return true;
        }
        if self.dots_left > 0 {
            self.dots_left -= 1;
            true
        } else {
            false
        }
    }

    fn name(&self) -> &'static str {
        "single-dot"
    }
}

/// Ordered validators for one edit.
pub struct FilterChain {
    kind: FieldKind,
    validators: Vec<Box<dyn CharValidator>>,
}

impl std::fmt::Debug for FilterChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.validators.iter().map(|v| v.name()).collect();
        f.debug_struct("FilterChain")
            .field("kind", &self.kind)
            .field("validators", &names)
            .finish()
    }
}

impl FilterChain {
    /// Build the chain for `kind` against the buffer text before the edit.
    pub fn for_kind(kind: FieldKind, current_text: &str) -> Self {
        let validators: Vec<Box<dyn CharValidator>> = match kind {
            FieldKind::Text => Vec::new(),
            FieldKind::Integer | FieldKind::UnsignedInteger => vec![Box::new(DigitValidator)],
            FieldKind::Float => vec![
                Box::new(FloatSymbolValidator),
                Box::new(SignPositionValidator),
                Box::new(SingleDotValidator::new(current_text)),
            ],
            FieldKind::UnsignedFloat => vec![
                Box::new(DigitOrDotValidator),
                Box::new(SingleDotValidator::new(current_text)),
            ],
        };
        Self { kind, validators }
    }

    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    /// Whether the chain lets everything through.
    pub fn is_passthrough(&self) -> bool {
        self.validators.is_empty()
    }

    /// Run `candidate` through the chain, returning the accepted characters.
    pub fn apply(&mut self, replace_start: usize, replace_count: usize, candidate: &str) -> String {
        if self.is_passthrough() {
            return candidate.to_string();
        }

        let mut accepted = String::with_capacity(candidate.len());
        let mut accepted_count = 0;
        for ch in candidate.chars() {
            let ctx = CharContext {
                replace_start,
                replace_count,
                ch,
                accepted_before: accepted_count,
            };
            // Stops at the first refusal so later stateful validators are not charged.
            if self.validators.iter_mut().all(|v| v.accept(&ctx)) {
                accepted.push(ch);
                accepted_count += 1;
            }
        }
        accepted
    }
}

/// Filter `candidate` for a replace of `replace_count` chars at `replace_start`.
pub fn filter_text(
    kind: FieldKind,
    current_text: &str,
    replace_start: usize,
    replace_count: usize,
    candidate: &str,
) -> String {
    FilterChain::for_kind(kind, current_text).apply(replace_start, replace_count, candidate)
}

/// A non-empty candidate filtered down to nothing means the user typed
/// something invalid, as opposed to deliberately inserting nothing.
pub fn is_rejection(candidate: &str, filtered: &str) -> bool {
    filtered.is_empty() && !candidate.is_empty()
}
