use swc_core::common::{BytePos, Span};
use swc_core::common::comments::SingleThreadedComments;

/// The directive prefix recognized in comments, for example
/// `// javascript-obfuscator:disable`.
pub const DIRECTIVE_PREFIX: &str = "javascript-obfuscator";

/// A directive found in a comment.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Directive {
    Disable,
    Enable
}

impl Directive {
    /// Parses the text of a comment. Whitespace around the colon is allowed.
    pub fn parse(text: &str) -> Option<Self> {
        let rest = text.trim().strip_prefix(DIRECTIVE_PREFIX)?;
        let rest = rest.trim_start().strip_prefix(':')?;

        match rest.trim() {
            "disable" => Some(Self::Disable),
            "enable" => Some(Self::Enable),
            _ => None
        }
    }
}

/// A source range in which no pass may transform nodes.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct GuardRegion {
    pub start: BytePos,
    pub end: BytePos
}

/// State of the directive scanner.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum GuardState {
    Enabled,
    Disabled {
        since: BytePos
    }
}

impl GuardState {
    /// Applies a directive found at `comment`.
    /// Returns the next state and the region closed by this directive, if any.
    pub fn transition(self, directive: Directive, comment: Span) -> (Self, Option<GuardRegion>) {
        match (self, directive) {
            (Self::Enabled, Directive::Disable) => (Self::Disabled { since: comment.hi }, None),
            // Repeated disables don't stack
            (Self::Disabled { since }, Directive::Disable) => (Self::Disabled { since }, None),
            (Self::Disabled { since }, Directive::Enable) => (
                Self::Enabled,
                Some(GuardRegion { start: since, end: comment.lo })
            ),
            (Self::Enabled, Directive::Enable) => (Self::Enabled, None)
        }
    }
}

/// The set of guarded regions of one source file.
#[derive(Debug, Clone, Default)]
pub struct Guard {
    /// Sorted and non-overlapping.
    regions: Vec<GuardRegion>
}

impl Guard {
    /// Builds the guard from every comment of the parsed file.
    pub fn from_comments(comments: &SingleThreadedComments) -> Self {
        let (leading, trailing) = comments.borrow_all();
        let mut all: Vec<(Span, String)> = leading
            .values()
            .chain(trailing.values())
            .flatten()
            .map(|comment| (comment.span, comment.text.to_string()))
            .collect();
        all.sort_by_key(|(span, _)| span.lo);

        Self::from_directives(all.iter().map(|(span, text)| (*span, text.as_str())))
    }

    /// Builds the guard from comments given in source order.
    pub fn from_directives<'a>(comments: impl IntoIterator<Item = (Span, &'a str)>) -> Self {
        let mut state = GuardState::Enabled;
        let mut regions = Vec::new();

        for (span, text) in comments {
            let directive = match Directive::parse(text) {
                Some(v) => v,
                None => continue
            };

            let (next, closed) = state.transition(directive, span);
            state = next;
            if let Some(region) = closed {
                regions.push(region);
            }
        }

        // An unmatched disable runs to the end of the file
        if let GuardState::Disabled { since } = state {
            regions.push(GuardRegion { start: since, end: BytePos(u32::MAX) });
        }

        Self { regions }
    }

    pub fn regions(&self) -> &[GuardRegion] {
        &self.regions
    }

    /// Whether a node starting at `span` must be left untouched.
    /// Synthesized nodes carry dummy spans and are never guarded.
    pub fn is_guarded(&self, span: Span) -> bool {
        if span.lo.0 == 0 || self.regions.is_empty() {
            return false;
        }

        let index = self.regions.partition_point(|region| region.end <= span.lo);
        match self.regions.get(index) {
            Some(region) => region.start <= span.lo,
            None => false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span(lo: u32, hi: u32) -> Span {
        Span::new(BytePos(lo), BytePos(hi), Default::default())
    }

    fn point(pos: u32) -> Span {
        span(pos, pos + 1)
    }

    #[test]
    fn test_parse_directive() {
        assert_eq!(Directive::parse(" javascript-obfuscator:disable"), Some(Directive::Disable));
        assert_eq!(Directive::parse("javascript-obfuscator : enable "), Some(Directive::Enable));
        assert_eq!(Directive::parse(" some other comment"), None);
        assert_eq!(Directive::parse("javascript-obfuscator:disabled"), None);
    }

    #[test]
    fn test_disable_enable_region() {
        let guard = Guard::from_directives([
            (span(10, 20), " javascript-obfuscator:disable"),
            (span(50, 60), " javascript-obfuscator:enable")
        ]);

        assert_eq!(guard.regions(), &[GuardRegion { start: BytePos(20), end: BytePos(50) }]);
        assert!(!guard.is_guarded(point(5)));
        assert!(guard.is_guarded(point(30)));
        assert!(!guard.is_guarded(point(70)));
    }

    #[test]
    fn test_unmatched_disable_runs_to_end() {
        let guard = Guard::from_directives([
            (span(10, 20), " javascript-obfuscator:disable")
        ]);

        assert!(guard.is_guarded(point(1_000_000)));
        assert!(!guard.is_guarded(point(3)));
    }

    #[test]
    fn test_repeated_disable_is_idempotent() {
        let guard = Guard::from_directives([
            (span(10, 20), " javascript-obfuscator:disable"),
            (span(30, 40), " javascript-obfuscator:disable"),
            (span(50, 60), " javascript-obfuscator:enable"),
            (span(70, 80), " javascript-obfuscator:enable")
        ]);

        assert_eq!(guard.regions(), &[GuardRegion { start: BytePos(20), end: BytePos(50) }]);
        assert!(guard.is_guarded(point(35)));
        assert!(!guard.is_guarded(point(65)));
    }

    #[test]
    fn test_multiple_regions() {
        let guard = Guard::from_directives([
            (span(10, 20), " javascript-obfuscator:disable"),
            (span(30, 40), " javascript-obfuscator:enable"),
            (span(50, 60), " javascript-obfuscator:disable"),
            (span(70, 80), " javascript-obfuscator:enable")
        ]);

        assert_eq!(guard.regions().len(), 2);
        assert!(guard.is_guarded(point(25)));
        assert!(!guard.is_guarded(point(45)));
        assert!(guard.is_guarded(point(65)));
    }

    #[test]
    fn test_dummy_span_never_guarded() {
        let guard = Guard::from_directives([
            (span(0, 0), " javascript-obfuscator:disable")
        ]);

        assert!(!guard.is_guarded(Default::default()));
    }
}
