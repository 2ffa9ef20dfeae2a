//! Byte-offset spans into a source file.

use serde::Serialize;

/// A half-open byte range `[start, end)` into the text of one source file.
///
/// Synthesized nodes use [`Span::DUMMY`]; they never map back to source and are
/// never targeted by span-keyed rewrites.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Span {
    pub start: u32,
    pub end: u32,
}

impl Span {
    pub const DUMMY: Span = Span {
        start: u32::MAX,
        end: u32::MAX,
    };

    #[inline]
    #[must_use]
    pub const fn new(start: u32, end: u32) -> Self {
        Span { start, end }
    }

    #[inline]
    #[must_use]
    pub const fn is_dummy(self) -> bool {
        self.start == u32::MAX
    }

    #[inline]
    #[must_use]
    pub const fn len(self) -> u32 {
        if self.is_dummy() {
            0
        } else {
            self.end.saturating_sub(self.start)
        }
    }

    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.len() == 0
    }

    /// Smallest span covering both `self` and `other`.
    #[must_use]
    pub fn to(self, other: Span) -> Span {
        if self.is_dummy() {
            return other;
        }
        if other.is_dummy() {
            return self;
        }
        Span::new(self.start.min(other.start), self.end.max(other.end))
    }

    /// Slice the span out of `text`, returning `""` for dummy or out-of-range spans.
    #[must_use]
    pub fn slice(self, text: &str) -> &str {
        if self.is_dummy() {
            return "";
        }
        text.get(self.start as usize..self.end as usize)
            .unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dummy_span_is_empty_and_slices_nothing() {
        assert!(Span::DUMMY.is_dummy());
        assert_eq!(Span::DUMMY.len(), 0);
        assert_eq!(Span::DUMMY.slice("abc"), "");
    }

    #[test]
    fn to_covers_both_spans() {
        let joined = Span::new(4, 6).to(Span::new(1, 3));
        assert_eq!(joined, Span::new(1, 6));
        assert_eq!(Span::DUMMY.to(Span::new(1, 2)), Span::new(1, 2));
        assert_eq!(Span::new(0, 3).slice("declare"), "dec");
    }
}
