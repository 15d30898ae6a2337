use swc_core::ecma::ast::{ComputedPropName, Expr, Lit, MemberExpr, MemberProp, Str};
use swc_core::ecma::visit::{VisitMut, VisitMutWith};
use crate::obfuscate::guard::Guard;

/// Converts expressions like `console.log` to `console["log"]`,
/// so that property names become string literals.
pub struct Visitor<'a> {
    guard: &'a Guard,

    /// The number of converted member expressions.
    pub converted: usize
}

impl<'a> Visitor<'a> {
    pub fn new(guard: &'a Guard) -> Self {
        Self {
            guard,
            converted: 0
        }
    }
}

impl<'a> VisitMut for Visitor<'a> {
    fn visit_mut_member_expr(&mut self, member: &mut MemberExpr) {
        member.visit_mut_children_with(self);

        if self.guard.is_guarded(member.span) {
            return;
        }

        if let MemberProp::Ident(ident) = &member.prop {
            member.prop = MemberProp::Computed(ComputedPropName {
                span: ident.span,
                expr: Box::new(Expr::Lit(Lit::Str(Str {
                    span: ident.span,
                    value: ident.sym.clone(),
                    raw: None
                })))
            });
            self.converted += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::options::Options;
    use crate::testing::{compact, obfuscate_compact};

    #[test]
    fn test_member_expr() {
        let output = obfuscate_compact("console.log(a.b.c, a[d]);", &Options::no_additional_nodes());

        assert_eq!(output, compact("console['log'](a['b']['c'], a[d]);"));
    }

    #[test]
    fn test_guarded_member_expr() {
        let output = obfuscate_compact(
            "a.b;\n// javascript-obfuscator:disable\nc.d;\n// javascript-obfuscator:enable\ne.f;",
            &Options::no_additional_nodes()
        );

        assert_eq!(output, compact("a['b']; c.d; e['f'];"));
    }
}
