//! Syntax level classification.
//!
//! oxc always parses the newest grammar, so edition gating happens on the AST:
//! every construct is tagged with the edition that introduced it and the first
//! one (by source offset) above the requested edition is reported.

use lazy_static::lazy_static;
use oxc_ast::ast::{
    ArrayAssignmentTarget, ArrayPattern, ArrowFunctionExpression, AssignmentExpression,
    AssignmentPattern, AwaitExpression, BigIntLiteral, BinaryExpression, BindingRestElement,
    CallExpression, CatchClause, Class, ComputedMemberExpression, Decorator,
    ExportAllDeclaration, ExportDefaultDeclaration, ExportNamedDeclaration, ForOfStatement,
    FormalParameter, FormalParameters, Function, Hashbang, ImportDeclaration, ImportExpression,
    LogicalExpression, MetaProperty, NewExpression, NumericLiteral, ObjectAssignmentTarget,
    ObjectExpression, ObjectPattern, ObjectProperty, ObjectPropertyKind, PrivateFieldExpression,
    PrivateIdentifier, Program, PropertyDefinition, RegExpLiteral, SpreadElement, StaticBlock,
    StaticMemberExpression, StringLiteral, Super, TemplateLiteral, VariableDeclaration,
    VariableDeclarationKind, YieldExpression,
};
use oxc_ast_visit::{walk, Visit};
use oxc_span::{GetSpan, Span};
use oxc_syntax::operator::{AssignmentOperator, BinaryOperator, LogicalOperator};
use oxc_syntax::scope::ScopeFlags;
use regex::Regex;

use crate::version::EcmaVersion;

lazy_static! {
    /// `(?i:…)`, `(?-m:…)`, `(?is-m:…)`; a plain `(?:` group has no flags.
    static ref REGEX_MODIFIERS_RE: Regex =
        Regex::new(r"(?:^|[^\\])\(\?(?:[ims]+(?:-[ims]*)?|-[ims]+):").unwrap();
}

/// The earliest construct that needs a newer edition than allowed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub offset: u32,
    pub feature: &'static str,
    pub requires: EcmaVersion,
}

impl Violation {
    pub fn message(&self) -> String {
        format!(
            "Unexpected token: {} requires {}",
            self.feature, self.requires
        )
    }
}

/// Walk `program` and return the first construct newer than `target`.
pub fn first_violation(program: &Program<'_>, code: &str, target: EcmaVersion) -> Option<Violation> {
    if target == EcmaVersion::Latest {
        return None;
    }
    let mut classifier = SyntaxLevel {
        code,
        target,
        function_depth: 0,
        first: None,
    };
    classifier.visit_program(program);
    classifier.first
}

struct SyntaxLevel<'s> {
    code: &'s str,
    target: EcmaVersion,
    function_depth: u32,
    first: Option<Violation>,
}

impl<'s> SyntaxLevel<'s> {
    fn require(&mut self, offset: u32, feature: &'static str, requires: EcmaVersion) {
        if requires <= self.target {
            return;
        }
        if self.first.as_ref().is_some_and(|v| v.offset <= offset) {
            return;
        }
        self.first = Some(Violation {
            offset,
            feature,
            requires,
        });
    }

    fn text(&self, span: Span) -> &'s str {
        self.code
            .get(span.start as usize..span.end as usize)
            .unwrap_or("")
    }

    /// Offset of `token` between `from` and `to`, falling back to `from`.
    fn token_offset(&self, from: u32, to: u32, token: &str) -> u32 {
        self.code
            .get(from as usize..to as usize)
            .and_then(|between| between.find(token))
            .map(|idx| from + idx as u32)
            .unwrap_or(from)
    }

    /// A `,` between the last list item and the closing paren.
    fn trailing_comma(&mut self, last_end: u32, close_end: u32, feature: &'static str) {
        let Some(between) = self.code.get(last_end as usize..close_end as usize) else {
            return;
        };
        if let Some(idx) = between.find(',') {
            self.require(last_end + idx as u32, feature, EcmaVersion::Es2017);
        }
    }

    fn optional_access(&mut self, object_end: u32, end: u32) {
        let offset = self.token_offset(object_end, end, "?.");
        self.require(offset, "optional chaining `?.`", EcmaVersion::Es2020);
    }

    fn check_regex(&mut self, span: Span) {
        let raw = self.text(span);
        let Some(slash) = raw.rfind('/') else {
            return;
        };
        let (pattern, flags) = raw.split_at(slash);
        for flag in flags.chars().skip(1) {
            match flag {
                'u' => self.require(span.start, "regular expression flag `u`", EcmaVersion::Es2015),
                'y' => self.require(span.start, "regular expression flag `y`", EcmaVersion::Es2015),
                's' => self.require(span.start, "regular expression flag `s`", EcmaVersion::Es2018),
                'd' => self.require(span.start, "regular expression flag `d`", EcmaVersion::Es2022),
                'v' => self.require(span.start, "regular expression flag `v`", EcmaVersion::Es2024),
                _ => {}
            }
        }
        if pattern.contains("(?<=") || pattern.contains("(?<!") {
            self.require(span.start, "regular expression lookbehind", EcmaVersion::Es2018);
        } else if pattern.contains("(?<") {
            self.require(span.start, "regular expression named group", EcmaVersion::Es2018);
        }
        if REGEX_MODIFIERS_RE.is_match(pattern) {
            self.require(span.start, "regular expression modifiers", EcmaVersion::Es2025);
        }
        if flags.contains('u') && (pattern.contains("\\p{") || pattern.contains("\\P{")) {
            self.require(
                span.start,
                "regular expression property escape",
                EcmaVersion::Es2018,
            );
        }
    }
}

impl<'a> Visit<'a> for SyntaxLevel<'_> {
    fn visit_hashbang(&mut self, it: &Hashbang<'a>) {
        self.require(it.span.start, "hashbang comment", EcmaVersion::Es2023);
    }

    // ── declarations ────────────────────────────────────────────────────────

    fn visit_variable_declaration(&mut self, it: &VariableDeclaration<'a>) {
        match it.kind {
            VariableDeclarationKind::Var => {}
            VariableDeclarationKind::Let => {
                self.require(it.span.start, "`let` declaration", EcmaVersion::Es2015)
            }
            VariableDeclarationKind::Const => {
                self.require(it.span.start, "`const` declaration", EcmaVersion::Es2015)
            }
            VariableDeclarationKind::Using | VariableDeclarationKind::AwaitUsing => {
                self.require(it.span.start, "`using` declaration", EcmaVersion::Latest)
            }
        }
        walk::walk_variable_declaration(self, it);
    }

    fn visit_function(&mut self, it: &Function<'a>, flags: ScopeFlags) {
        if it.r#async && it.generator {
            self.require(it.span.start, "async generator", EcmaVersion::Es2018);
        } else if it.r#async {
            self.require(it.span.start, "async function", EcmaVersion::Es2017);
        } else if it.generator {
            self.require(it.span.start, "generator function", EcmaVersion::Es2015);
        }
        self.function_depth += 1;
        walk::walk_function(self, it, flags);
        self.function_depth -= 1;
    }

    fn visit_arrow_function_expression(&mut self, it: &ArrowFunctionExpression<'a>) {
        if it.r#async {
            self.require(it.span.start, "async arrow function", EcmaVersion::Es2017);
        }
        let arrow = self.token_offset(it.params.span.end, it.body.span.start, "=>");
        self.require(arrow, "arrow function", EcmaVersion::Es2015);
        self.function_depth += 1;
        walk::walk_arrow_function_expression(self, it);
        self.function_depth -= 1;
    }

    fn visit_class(&mut self, it: &Class<'a>) {
        self.require(it.span.start, "class", EcmaVersion::Es2015);
        walk::walk_class(self, it);
    }

    fn visit_property_definition(&mut self, it: &PropertyDefinition<'a>) {
        self.require(it.span.start, "class field", EcmaVersion::Es2022);
        // Field initializers behave like function bodies for `await`.
        self.function_depth += 1;
        walk::walk_property_definition(self, it);
        self.function_depth -= 1;
    }

    fn visit_static_block(&mut self, it: &StaticBlock<'a>) {
        self.require(it.span.start, "class static block", EcmaVersion::Es2022);
        self.function_depth += 1;
        walk::walk_static_block(self, it);
        self.function_depth -= 1;
    }

    fn visit_private_identifier(&mut self, it: &PrivateIdentifier<'a>) {
        self.require(it.span.start, "private name", EcmaVersion::Es2022);
    }

    fn visit_decorator(&mut self, it: &Decorator<'a>) {
        self.require(it.span.start, "decorator", EcmaVersion::Latest);
        walk::walk_decorator(self, it);
    }

    fn visit_super(&mut self, it: &Super) {
        self.require(it.span.start, "`super`", EcmaVersion::Es2015);
    }

    // ── modules ─────────────────────────────────────────────────────────────

    fn visit_import_declaration(&mut self, it: &ImportDeclaration<'a>) {
        if let Some(with_clause) = &it.with_clause {
            self.require(with_clause.span.start, "import attributes", EcmaVersion::Es2025);
        }
        self.require(it.span.start, "`import` declaration", EcmaVersion::Es2015);
        walk::walk_import_declaration(self, it);
    }

    fn visit_export_named_declaration(&mut self, it: &ExportNamedDeclaration<'a>) {
        if let Some(with_clause) = &it.with_clause {
            self.require(with_clause.span.start, "import attributes", EcmaVersion::Es2025);
        }
        self.require(it.span.start, "`export` declaration", EcmaVersion::Es2015);
        walk::walk_export_named_declaration(self, it);
    }

    fn visit_export_default_declaration(&mut self, it: &ExportDefaultDeclaration<'a>) {
        self.require(it.span.start, "`export` declaration", EcmaVersion::Es2015);
        walk::walk_export_default_declaration(self, it);
    }

    fn visit_export_all_declaration(&mut self, it: &ExportAllDeclaration<'a>) {
        if it.exported.is_some() {
            self.require(it.span.start, "`export * as` declaration", EcmaVersion::Es2020);
        }
        if let Some(with_clause) = &it.with_clause {
            self.require(with_clause.span.start, "import attributes", EcmaVersion::Es2025);
        }
        self.require(it.span.start, "`export` declaration", EcmaVersion::Es2015);
        walk::walk_export_all_declaration(self, it);
    }

    fn visit_import_expression(&mut self, it: &ImportExpression<'a>) {
        self.require(it.span.start, "dynamic `import()`", EcmaVersion::Es2020);
        walk::walk_import_expression(self, it);
    }

    fn visit_meta_property(&mut self, it: &MetaProperty<'a>) {
        match it.meta.name.as_str() {
            "import" => self.require(it.span.start, "`import.meta`", EcmaVersion::Es2020),
            _ => self.require(it.span.start, "`new.target`", EcmaVersion::Es2015),
        }
    }

    // ── patterns, spread and rest ───────────────────────────────────────────

    fn visit_array_pattern(&mut self, it: &ArrayPattern<'a>) {
        self.require(it.span.start, "destructuring", EcmaVersion::Es2015);
        walk::walk_array_pattern(self, it);
    }

    fn visit_object_pattern(&mut self, it: &ObjectPattern<'a>) {
        if let Some(rest) = &it.rest {
            self.require(rest.span.start, "object rest properties", EcmaVersion::Es2018);
        }
        self.require(it.span.start, "destructuring", EcmaVersion::Es2015);
        walk::walk_object_pattern(self, it);
    }

    fn visit_formal_parameters(&mut self, it: &FormalParameters<'a>) {
        if it.rest.is_none() {
            if let Some(last) = it.items.last() {
                let last_end = last
                    .initializer
                    .as_ref()
                    .map_or(last.span.end, |init| init.span().end.max(last.span.end));
                self.trailing_comma(last_end, it.span.end, "trailing comma in parameter list");
            }
        }
        walk::walk_formal_parameters(self, it);
    }

    fn visit_formal_parameter(&mut self, it: &FormalParameter<'a>) {
        if it.initializer.is_some() {
            self.require(it.span.start, "default value", EcmaVersion::Es2015);
        }
        walk::walk_formal_parameter(self, it);
    }

    fn visit_assignment_pattern(&mut self, it: &AssignmentPattern<'a>) {
        self.require(it.span.start, "default value", EcmaVersion::Es2015);
        walk::walk_assignment_pattern(self, it);
    }

    fn visit_binding_rest_element(&mut self, it: &BindingRestElement<'a>) {
        self.require(it.span.start, "rest element", EcmaVersion::Es2015);
        walk::walk_binding_rest_element(self, it);
    }

    fn visit_array_assignment_target(&mut self, it: &ArrayAssignmentTarget<'a>) {
        self.require(it.span.start, "destructuring assignment", EcmaVersion::Es2015);
        walk::walk_array_assignment_target(self, it);
    }

    fn visit_object_assignment_target(&mut self, it: &ObjectAssignmentTarget<'a>) {
        if it.rest.is_some() {
            self.require(it.span.start, "object rest properties", EcmaVersion::Es2018);
        }
        self.require(it.span.start, "destructuring assignment", EcmaVersion::Es2015);
        walk::walk_object_assignment_target(self, it);
    }

    fn visit_object_expression(&mut self, it: &ObjectExpression<'a>) {
        for property in &it.properties {
            if let ObjectPropertyKind::SpreadProperty(spread) = property {
                self.require(spread.span.start, "object spread", EcmaVersion::Es2018);
            }
        }
        walk::walk_object_expression(self, it);
    }

    fn visit_spread_element(&mut self, it: &SpreadElement<'a>) {
        self.require(it.span.start, "spread element", EcmaVersion::Es2015);
        walk::walk_spread_element(self, it);
    }

    fn visit_object_property(&mut self, it: &ObjectProperty<'a>) {
        if it.computed {
            self.require(it.span.start, "computed property name", EcmaVersion::Es2015);
        } else if it.method {
            self.require(it.span.start, "shorthand method", EcmaVersion::Es2015);
        } else if it.shorthand {
            self.require(it.span.start, "shorthand property", EcmaVersion::Es2015);
        }
        walk::walk_object_property(self, it);
    }

    // ── statements ──────────────────────────────────────────────────────────

    fn visit_for_of_statement(&mut self, it: &ForOfStatement<'a>) {
        if it.r#await {
            self.require(it.span.start, "`for await` loop", EcmaVersion::Es2018);
        }
        self.require(it.span.start, "`for...of` loop", EcmaVersion::Es2015);
        walk::walk_for_of_statement(self, it);
    }

    fn visit_catch_clause(&mut self, it: &CatchClause<'a>) {
        if it.param.is_none() {
            self.require(it.span.start, "optional catch binding", EcmaVersion::Es2019);
        }
        walk::walk_catch_clause(self, it);
    }

    // ── expressions ─────────────────────────────────────────────────────────

    fn visit_template_literal(&mut self, it: &TemplateLiteral<'a>) {
        self.require(it.span.start, "template literal", EcmaVersion::Es2015);
        walk::walk_template_literal(self, it);
    }

    fn visit_yield_expression(&mut self, it: &YieldExpression<'a>) {
        self.require(it.span.start, "`yield`", EcmaVersion::Es2015);
        walk::walk_yield_expression(self, it);
    }

    fn visit_await_expression(&mut self, it: &AwaitExpression<'a>) {
        if self.function_depth == 0 {
            self.require(it.span.start, "top-level `await`", EcmaVersion::Es2022);
        } else {
            self.require(it.span.start, "`await`", EcmaVersion::Es2017);
        }
        walk::walk_await_expression(self, it);
    }

    fn visit_binary_expression(&mut self, it: &BinaryExpression<'a>) {
        if it.operator == BinaryOperator::Exponential {
            let offset = self.token_offset(it.left.span().end, it.right.span().start, "**");
            self.require(offset, "exponentiation operator `**`", EcmaVersion::Es2016);
        }
        walk::walk_binary_expression(self, it);
    }

    fn visit_logical_expression(&mut self, it: &LogicalExpression<'a>) {
        if it.operator == LogicalOperator::Coalesce {
            let offset = self.token_offset(it.left.span().end, it.right.span().start, "??");
            self.require(offset, "nullish coalescing `??`", EcmaVersion::Es2020);
        }
        walk::walk_logical_expression(self, it);
    }

    fn visit_assignment_expression(&mut self, it: &AssignmentExpression<'a>) {
        let gated = match it.operator {
            AssignmentOperator::Exponential => {
                Some(("**=", "exponentiation assignment `**=`", EcmaVersion::Es2016))
            }
            AssignmentOperator::LogicalAnd => {
                Some(("&&=", "logical assignment `&&=`", EcmaVersion::Es2021))
            }
            AssignmentOperator::LogicalOr => {
                Some(("||=", "logical assignment `||=`", EcmaVersion::Es2021))
            }
            AssignmentOperator::LogicalNullish => {
                Some(("??=", "logical assignment `??=`", EcmaVersion::Es2021))
            }
            _ => None,
        };
        if let Some((token, feature, version)) = gated {
            let offset = self.token_offset(it.span.start, it.right.span().start, token);
            self.require(offset, feature, version);
        }
        walk::walk_assignment_expression(self, it);
    }

    fn visit_static_member_expression(&mut self, it: &StaticMemberExpression<'a>) {
        if it.optional {
            self.optional_access(it.object.span().end, it.property.span.start);
        }
        walk::walk_static_member_expression(self, it);
    }

    fn visit_computed_member_expression(&mut self, it: &ComputedMemberExpression<'a>) {
        if it.optional {
            self.optional_access(it.object.span().end, it.expression.span().start);
        }
        walk::walk_computed_member_expression(self, it);
    }

    fn visit_private_field_expression(&mut self, it: &PrivateFieldExpression<'a>) {
        if it.optional {
            self.optional_access(it.object.span().end, it.field.span.start);
        }
        walk::walk_private_field_expression(self, it);
    }

    fn visit_call_expression(&mut self, it: &CallExpression<'a>) {
        if it.optional {
            self.optional_access(it.callee.span().end, it.span.end);
        }
        if let Some(last) = it.arguments.last() {
            self.trailing_comma(last.span().end, it.span.end, "trailing comma in arguments");
        }
        walk::walk_call_expression(self, it);
    }

    fn visit_new_expression(&mut self, it: &NewExpression<'a>) {
        if let Some(last) = it.arguments.last() {
            self.trailing_comma(last.span().end, it.span.end, "trailing comma in arguments");
        }
        walk::walk_new_expression(self, it);
    }

    // ── literals ────────────────────────────────────────────────────────────

    fn visit_numeric_literal(&mut self, it: &NumericLiteral<'a>) {
        let raw = self.text(it.span);
        let lower = raw.get(..2).map(str::to_ascii_lowercase);
        if matches!(lower.as_deref(), Some("0b") | Some("0o")) {
            self.require(it.span.start, "binary or octal literal", EcmaVersion::Es2015);
        }
        if raw.contains('_') {
            self.require(it.span.start, "numeric separator", EcmaVersion::Es2021);
        }
    }

    fn visit_big_int_literal(&mut self, it: &BigIntLiteral<'a>) {
        self.require(it.span.start, "BigInt literal", EcmaVersion::Es2020);
        if self.text(it.span).contains('_') {
            self.require(it.span.start, "numeric separator", EcmaVersion::Es2021);
        }
    }

    fn visit_string_literal(&mut self, it: &StringLiteral<'a>) {
        if self.text(it.span).contains("\\u{") {
            self.require(it.span.start, "unicode code point escape", EcmaVersion::Es2015);
        }
    }

    fn visit_reg_exp_literal(&mut self, it: &RegExpLiteral<'a>) {
        self.check_regex(it.span);
    }
}
