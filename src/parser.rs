//! Parser for the textual IR that [`Module::dump`] prints.
//!
//! Values must be defined before they are used in program text. Blocks may be referenced
//! anywhere in their function.

use std::collections::HashMap;

use crate::{
    ir::{
        Argument, BinaryOp, BlockRef, Constant, Function, InstKind, Module, ScalarConst, ValueRef,
    },
    ty::{ScalarType, TypeContext, TypeRef, ValueType},
    utils::{BoolToErrorHelper, Located},
};

use self::tokenizer::{Token, TokenKind, TokenizerError};

pub mod tokenizer;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    InvalidToken(TokenizerError),
    ExpectedKeyword(&'static str),
    ExpectedKind(TokenKind),
    ExpectedType,
    ExpectedValue,
    ExpectedInstruction,
    UndefinedValue(String),
    UndefinedLabel(String),
    DuplicateName(String),
    TypeMismatch { expected: String, found: String },
    InvalidLiteral(String),
    ElementCountMismatch { expected: u32, found: u32 },
}

pub type ParseResult<T> = Result<T, Located<ParseError>>;

pub struct ParseState<'s> {
    pub token_list: Vec<Token<'s>>,
    pub token_ptr: usize,
}
impl<'s> ParseState<'s> {
    pub fn new(token_list: Vec<Token<'s>>) -> Self {
        Self {
            token_list,
            token_ptr: 0,
        }
    }

    #[inline]
    pub fn current_token(&self) -> Option<&Token<'s>> {
        self.token_list.get(self.token_ptr)
    }

    #[inline]
    pub fn peek_kind(&self, offset: usize) -> Option<TokenKind> {
        self.token_list.get(self.token_ptr + offset).map(|t| t.kind)
    }

    #[inline]
    pub fn check_keyword(&self, kw: &str) -> bool {
        self.current_token()
            .is_some_and(|t| t.kind == TokenKind::Keyword && t.slice == kw)
    }

    #[inline]
    pub fn consume_token(&mut self) {
        self.token_ptr += 1;
    }

    #[inline]
    pub fn consume_keyword(&mut self, kw: &'static str) -> ParseResult<&Token<'s>> {
        match self.token_list.get(self.token_ptr) {
            Some(x) if x.kind == TokenKind::Keyword && x.slice == kw => {
                self.token_ptr += 1;
                Ok(x)
            }
            t => Err(self.err_on(ParseError::ExpectedKeyword(kw), t)),
        }
    }

    #[inline]
    pub fn consume_by_kind(&mut self, kind: TokenKind) -> ParseResult<&Token<'s>> {
        match self.token_list.get(self.token_ptr) {
            Some(x) if x.kind == kind => {
                self.token_ptr += 1;
                Ok(x)
            }
            t => Err(self.err_on(ParseError::ExpectedKind(kind), t)),
        }
    }

    #[inline]
    pub fn err_on(&self, kind: ParseError, tref: Option<&Token<'s>>) -> Located<ParseError> {
        Located {
            t: kind,
            line: tref
                .or_else(|| self.token_list.last())
                .map_or(0, |t| t.line),
            col: tref.or_else(|| self.token_list.last()).map_or(0, |t| t.col),
        }
    }

    #[inline]
    pub fn err(&self, kind: ParseError) -> Located<ParseError> {
        self.err_on(kind, self.current_token())
    }
}

/// Parses every `define` in `source`.
pub fn parse_module<'t>(source: &str, types: &TypeContext<'t>) -> ParseResult<Module<'t>> {
    let tokens = tokenizer::tokenize(source).map_err(|e| e.map(ParseError::InvalidToken))?;
    let mut state = ParseState::new(tokens);

    let mut functions = Vec::new();
    while state.current_token().is_some() {
        functions.push(FunctionParser::parse(&mut state, types)?);
    }

    Ok(Module { functions })
}

fn parse_type<'t>(state: &mut ParseState, types: &TypeContext<'t>) -> ParseResult<TypeRef<'t>> {
    match state.current_token() {
        Some(t) if t.kind == TokenKind::Identifier && t.slice == "void" => {
            state.consume_token();
            Ok(types.void())
        }
        Some(t) if t.kind == TokenKind::Identifier => {
            let s = ScalarType::from_name(t.slice).ok_or_else(|| state.err(ParseError::ExpectedType))?;
            state.consume_token();
            Ok(types.scalar(s))
        }
        Some(t) if t.kind == TokenKind::OpenAngleBracket => {
            state.consume_token();
            let count_token = state.consume_by_kind(TokenKind::Number)?.clone();
            let count = count_token.slice.parse::<u32>().map_err(|_| {
                state.err_on(
                    ParseError::InvalidLiteral(count_token.slice.into()),
                    Some(&count_token),
                )
            })?;
            match state.current_token() {
                Some(t) if t.kind == TokenKind::Identifier && t.slice == "x" => {
                    state.consume_token()
                }
                t => return Err(state.err_on(ParseError::ExpectedKeyword("x"), t)),
            }
            let s = parse_scalar_type(state)?;
            state.consume_by_kind(TokenKind::CloseAngleBracket)?;

            Ok(types.vector(s, count))
        }
        t => Err(state.err_on(ParseError::ExpectedType, t)),
    }
}

fn parse_scalar_type(state: &mut ParseState) -> ParseResult<ScalarType> {
    let s = state
        .current_token()
        .filter(|t| t.kind == TokenKind::Identifier)
        .and_then(|t| ScalarType::from_name(t.slice))
        .ok_or_else(|| state.err(ParseError::ExpectedType))?;
    state.consume_token();

    Ok(s)
}

/// A single lane literal: a number, `true` or `false`.
/// Whether `v` is representable in `ty`'s bit width, read either as signed or as unsigned.
fn fits_int_width(ty: ScalarType, v: i64) -> bool {
    match ty.bit_width() {
        w @ 1..=63 => (-(1i64 << (w - 1))..=(1i64 << w) - 1).contains(&v),
        _ => true,
    }
}

fn parse_scalar_literal(state: &mut ParseState, ty: ScalarType) -> ParseResult<ScalarConst> {
    let Some(t) = state.current_token() else {
        return Err(state.err(ParseError::ExpectedValue));
    };
    let invalid = || state.err_on(ParseError::InvalidLiteral(t.slice.into()), Some(t));

    let value = match t.kind {
        TokenKind::Keyword if t.slice == "true" || t.slice == "false" => {
            (ty == ScalarType::I1).or_err(invalid)?;
            ScalarConst::Int(u64::from(t.slice == "true"))
        }
        TokenKind::Number if ty.is_float() => {
            if let Some(hex) = t.slice.strip_prefix("0x").or_else(|| t.slice.strip_prefix("0X")) {
                ScalarConst::Float(u64::from_str_radix(hex, 16).map_err(|_| invalid())?)
            } else {
                ScalarConst::float(t.slice.parse::<f64>().map_err(|_| invalid())?)
            }
        }
        TokenKind::Number => {
            if let Some(hex) = t.slice.strip_prefix("0x").or_else(|| t.slice.strip_prefix("0X")) {
                let v = u64::from_str_radix(hex, 16).map_err(|_| invalid())?;
                (v <= ty.int_mask()).or_err(invalid)?;
                ScalarConst::Int(v)
            } else {
                let v = t.slice.parse::<i64>().map_err(|_| invalid())?;
                fits_int_width(ty, v).or_err(invalid)?;
                ScalarConst::int(ty, v)
            }
        }
        _ => return Err(state.err(ParseError::ExpectedValue)),
    };
    state.consume_token();

    Ok(value)
}

fn type_mismatch(expected: TypeRef, found: TypeRef) -> ParseError {
    ParseError::TypeMismatch {
        expected: expected.to_string(),
        found: found.to_string(),
    }
}

/// Per-function name tables while a `define` is being read.
struct FunctionParser<'p, 't> {
    types: &'p TypeContext<'t>,
    func: Function<'t>,
    values: HashMap<String, ValueRef>,
    labels: HashMap<String, BlockRef>,
}
impl<'p, 't> FunctionParser<'p, 't> {
    fn parse(state: &mut ParseState, types: &'p TypeContext<'t>) -> ParseResult<Function<'t>> {
        state.consume_keyword("define")?;
        let return_type = parse_type(state, types)?;
        let name = state.consume_by_kind(TokenKind::GlobalName)?.slice[1..].to_owned();

        state.consume_by_kind(TokenKind::OpenParenthese)?;
        let mut args = Vec::new();
        let mut values = HashMap::new();
        while state.peek_kind(0) != Some(TokenKind::CloseParenthese) {
            if !args.is_empty() {
                state.consume_by_kind(TokenKind::Comma)?;
            }
            let ty = parse_type(state, types)?;
            let name_token = state.consume_by_kind(TokenKind::LocalName)?.clone();
            let name = name_token.slice[1..].to_owned();
            if values.insert(name.clone(), ValueRef::Arg(args.len())).is_some() {
                return Err(state.err_on(ParseError::DuplicateName(name), Some(&name_token)));
            }
            args.push(Argument { name, ty });
        }
        state.consume_by_kind(TokenKind::CloseParenthese)?;
        state.consume_by_kind(TokenKind::OpenBrace)?;

        let mut this = Self {
            types,
            func: Function::new(name, args, return_type),
            values,
            labels: HashMap::new(),
        };
        this.declare_blocks(state)?;

        let mut current = BlockRef(0);
        while state.peek_kind(0) != Some(TokenKind::CloseBrace) {
            if state.peek_kind(0) == Some(TokenKind::Identifier)
                && state.peek_kind(1) == Some(TokenKind::Colon)
            {
                let label = state.token_list[state.token_ptr].slice;
                current = this.labels[label];
                state.consume_token();
                state.consume_token();
                continue;
            }

            this.parse_instruction(state, current)?;
        }
        state.consume_by_kind(TokenKind::CloseBrace)?;

        Ok(this.func)
    }

    /// Creates every block of the body up front, in textual order, so that branches can
    /// name blocks that come later.
    fn declare_blocks(&mut self, state: &ParseState) -> ParseResult<()> {
        let body = &state.token_list[state.token_ptr..];
        let starts_with_label = matches!(
            body,
            [a, b, ..] if a.kind == TokenKind::Identifier && b.kind == TokenKind::Colon
        );
        if !starts_with_label {
            let b = self.func.add_block("entry");
            self.labels.insert("entry".into(), b);
        }

        for w in body
            .windows(2)
            .take_while(|w| w[0].kind != TokenKind::CloseBrace)
        {
            if w[0].kind == TokenKind::Identifier && w[1].kind == TokenKind::Colon {
                if self.labels.contains_key(w[0].slice) {
                    return Err(
                        state.err_on(ParseError::DuplicateName(w[0].slice.into()), Some(&w[0]))
                    );
                }
                let b = self.func.add_block(w[0].slice);
                self.labels.insert(w[0].slice.into(), b);
            }
        }

        Ok(())
    }

    fn parse_label(&self, state: &mut ParseState) -> ParseResult<BlockRef> {
        state.consume_keyword("label")?;
        let t = state.consume_by_kind(TokenKind::LocalName)?.clone();
        let label = &t.slice[1..];

        match self.labels.get(label) {
            Some(&b) => Ok(b),
            None => Err(state.err_on(ParseError::UndefinedLabel(label.into()), Some(&t))),
        }
    }

    fn parse_value(&mut self, state: &mut ParseState, ty: TypeRef<'t>) -> ParseResult<ValueRef> {
        let Some(t) = state.current_token() else {
            return Err(state.err(ParseError::ExpectedValue));
        };

        match t.kind {
            TokenKind::LocalName => {
                let name = &t.slice[1..];
                let v = *self
                    .values
                    .get(name)
                    .ok_or_else(|| state.err(ParseError::UndefinedValue(name.into())))?;
                let found = self.func.value_type(v);
                (found == ty).or_err(|| state.err(type_mismatch(ty, found)))?;
                state.consume_token();

                Ok(v)
            }
            TokenKind::Keyword if t.slice == "undef" => {
                state.consume_token();
                Ok(self.func.constant(Constant::undef(ty)))
            }
            TokenKind::Keyword if t.slice == "zeroinitializer" => {
                state.consume_token();
                Ok(self.func.constant(Constant::zero(ty)))
            }
            TokenKind::OpenAngleBracket => {
                let &ValueType::Vector(s, count) = &*ty else {
                    return Err(state.err(ParseError::InvalidLiteral(t.slice.into())));
                };
                state.consume_token();

                let mut elements = Vec::new();
                while state.peek_kind(0) != Some(TokenKind::CloseAngleBracket) {
                    if !elements.is_empty() {
                        state.consume_by_kind(TokenKind::Comma)?;
                    }
                    let lane_ty = parse_type(state, self.types)?;
                    let expected = self.types.scalar(s);
                    (lane_ty == expected).or_err(|| state.err(type_mismatch(expected, lane_ty)))?;
                    elements.push(parse_scalar_literal(state, s)?);
                }
                let found = elements.len() as u32;
                (found == count).or_err(|| {
                    state.err(ParseError::ElementCountMismatch {
                        expected: count,
                        found,
                    })
                })?;
                state.consume_by_kind(TokenKind::CloseAngleBracket)?;

                Ok(self.func.constant(Constant::vector(ty, elements)))
            }
            TokenKind::Number | TokenKind::Keyword => {
                let &ValueType::Scalar(s) = &*ty else {
                    return Err(state.err(ParseError::InvalidLiteral(t.slice.into())));
                };
                let value = parse_scalar_literal(state, s)?;

                Ok(self.func.constant(Constant::scalar(ty, value)))
            }
            _ => Err(state.err(ParseError::ExpectedValue)),
        }
    }

    fn parse_typed_value(&mut self, state: &mut ParseState) -> ParseResult<ValueRef> {
        let ty = parse_type(state, self.types)?;
        self.parse_value(state, ty)
    }

    fn parse_condition(&mut self, state: &mut ParseState) -> ParseResult<ValueRef> {
        let t = state.token_ptr;
        let cond = self.parse_typed_value(state)?;
        let ty = self.func.value_type(cond);
        (ty.scalar_type() == Some(ScalarType::I1)).or_err(|| {
            state.err_on(
                ParseError::TypeMismatch {
                    expected: "i1".into(),
                    found: ty.to_string(),
                },
                state.token_list.get(t),
            )
        })?;

        Ok(cond)
    }

    fn parse_instruction(&mut self, state: &mut ParseState, block: BlockRef) -> ParseResult<()> {
        let head = state.token_ptr;
        let name = if state.peek_kind(0) == Some(TokenKind::LocalName)
            && state.peek_kind(1) == Some(TokenKind::Eq)
        {
            let name = state.token_list[head].slice[1..].to_owned();
            state.consume_token();
            state.consume_token();
            Some(name)
        } else {
            None
        };

        let Some(op) = state.current_token().cloned() else {
            return Err(state.err(ParseError::ExpectedInstruction));
        };
        state.consume_token();
        let (ty, kind, operands) = match (op.kind, op.slice, BinaryOp::from_name(op.slice)) {
            (TokenKind::Keyword, "call", _) => {
                let ty = parse_type(state, self.types)?;
                let callee = state.consume_by_kind(TokenKind::GlobalName)?.slice[1..].to_owned();
                state.consume_by_kind(TokenKind::OpenParenthese)?;
                let mut args = Vec::new();
                while state.peek_kind(0) != Some(TokenKind::CloseParenthese) {
                    if !args.is_empty() {
                        state.consume_by_kind(TokenKind::Comma)?;
                    }
                    args.push(self.parse_typed_value(state)?);
                }
                state.consume_by_kind(TokenKind::CloseParenthese)?;

                (ty, InstKind::call(callee), args)
            }
            (TokenKind::Identifier, _, Some(binop)) => {
                let ty = parse_type(state, self.types)?;
                let lhs = self.parse_value(state, ty)?;
                state.consume_by_kind(TokenKind::Comma)?;
                let rhs = self.parse_value(state, ty)?;

                (ty, InstKind::Binary(binop), vec![lhs, rhs])
            }
            (TokenKind::Keyword, "select", _) => {
                let cond = self.parse_condition(state)?;
                state.consume_by_kind(TokenKind::Comma)?;
                let then_value = self.parse_typed_value(state)?;
                let ty = self.func.value_type(then_value);
                state.consume_by_kind(TokenKind::Comma)?;
                let else_ty = parse_type(state, self.types)?;
                (else_ty == ty).or_err(|| state.err(type_mismatch(ty, else_ty)))?;
                let else_value = self.parse_value(state, ty)?;

                (ty, InstKind::Select, vec![cond, then_value, else_value])
            }
            (TokenKind::Keyword, "bitcast", _) => {
                let v = self.parse_typed_value(state)?;
                state.consume_keyword("to")?;
                let ty = parse_type(state, self.types)?;

                (ty, InstKind::BitCast, vec![v])
            }
            (TokenKind::Keyword, "ret", _) => {
                let ty = parse_type(state, self.types)?;
                let expected = self.func.return_type;
                (ty == expected).or_err(|| state.err(type_mismatch(expected, ty)))?;
                let operands = if ty.is_void() {
                    Vec::new()
                } else {
                    vec![self.parse_value(state, ty)?]
                };

                (self.types.void(), InstKind::Ret, operands)
            }
            (TokenKind::Keyword, "br", _) if state.check_keyword("label") => {
                let target = self.parse_label(state)?;

                (self.types.void(), InstKind::Br(target), Vec::new())
            }
            (TokenKind::Keyword, "br", _) => {
                let cond = self.parse_condition(state)?;
                state.consume_by_kind(TokenKind::Comma)?;
                let then_block = self.parse_label(state)?;
                state.consume_by_kind(TokenKind::Comma)?;
                let else_block = self.parse_label(state)?;

                (
                    self.types.void(),
                    InstKind::CondBr {
                        then_block,
                        else_block,
                    },
                    vec![cond],
                )
            }
            _ => return Err(state.err_on(ParseError::ExpectedInstruction, Some(&op))),
        };

        if let Some(ref name) = name {
            if self.values.contains_key(name) {
                return Err(state.err_on(
                    ParseError::DuplicateName(name.clone()),
                    state.token_list.get(head),
                ));
            }
        }
        let inst = self.func.append(block, name.clone(), ty, kind, operands);
        if let Some(name) = name {
            self.values.insert(name, inst.into());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use typed_arena::Arena;

    use super::*;
    use crate::ir::{ConstantKind, IntrinsicId};

    const SAMPLE: &str = r#"
; a read of the low half, then a write back
define <8 x i32> @f(<8 x i32> %v, i1 %c) {
entry:
  %lo = call <4 x i32> @llvm.genx.rdregioni.v4i32.v8i32.i16(<8 x i32> %v, i32 4, i32 4, i32 1, i16 0, i32 undef)
  %w = call <8 x i32> @llvm.genx.wrregioni.v8i32.v4i32.i16.i1(<8 x i32> %v, <4 x i32> %lo, i32 4, i32 4, i32 1, i16 0, i32 undef, i1 true)
  br i1 %c, label %then, label %exit
then:
  %s = select i1 %c, <8 x i32> %w, <8 x i32> zeroinitializer
  br label %exit
exit:
  ret <8 x i32> %v
}
"#;

    #[test]
    fn parses_and_prints_back() {
        let arena = Arena::new();
        let types = TypeContext::new(&arena);
        let module = parse_module(SAMPLE, &types).unwrap();
        assert_eq!(module.functions.len(), 1);

        let f = &module.functions[0];
        assert_eq!(f.blocks.len(), 3);
        assert_eq!(f.instruction_count(), 6);

        let lo = f.instructions().next().unwrap();
        assert_eq!(f.intrinsic_id(lo), Some(IntrinsicId::RdRegionI));
        assert!(f.is_undef(f.operand(lo, 5)));

        let printed = module.dump_to_string();
        let reparsed = parse_module(&printed, &types).unwrap();
        assert_eq!(reparsed.dump_to_string(), printed);
    }

    #[test]
    fn implicit_entry_block_and_literals() {
        let arena = Arena::new();
        let types = TypeContext::new(&arena);
        let module = parse_module(
            "define <2 x float> @g() {\n  ret <2 x float> <float 1.5, float -2.0>\n}",
            &types,
        )
        .unwrap();

        let f = &module.functions[0];
        assert_eq!(f.blocks[0].label, "entry");
        let ret = f.instructions().next().unwrap();
        let c = f.as_constant(f.operand(ret, 0)).unwrap();
        assert_eq!(
            c.kind,
            ConstantKind::Vector(vec![ScalarConst::float(1.5), ScalarConst::float(-2.0)])
        );
    }

    #[test]
    fn located_errors() {
        let arena = Arena::new();
        let types = TypeContext::new(&arena);

        let e = parse_module("define i32 @f() {\n  ret i32 %nope\n}", &types).unwrap_err();
        assert_eq!(e.t, ParseError::UndefinedValue("nope".into()));
        assert_eq!((e.line, e.col), (1, 10));

        let e = parse_module(
            "define i32 @f(i32 %a) {\n  %a = add i32 %a, 1\n  ret i32 %a\n}",
            &types,
        )
        .unwrap_err();
        assert_eq!(e.t, ParseError::DuplicateName("a".into()));

        let e = parse_module(
            "define void @f() {\n  ret <2 x i32> <i32 1>\n}",
            &types,
        )
        .unwrap_err();
        assert!(matches!(e.t, ParseError::TypeMismatch { .. }));

        let e = parse_module(
            "define <2 x i32> @f() {\n  ret <2 x i32> <i32 1>\n}",
            &types,
        )
        .unwrap_err();
        assert_eq!(
            e.t,
            ParseError::ElementCountMismatch {
                expected: 2,
                found: 1
            }
        );

        let e = parse_module("define void @f() {\n  br label %nowhere\n}", &types).unwrap_err();
        assert_eq!(e.t, ParseError::UndefinedLabel("nowhere".into()));
    }

    #[test]
    fn unnamed_values_and_special_floats_print_back_readably() {
        let arena = Arena::new();
        let types = TypeContext::new(&arena);
        let module = parse_module(
            "define i32 @f(i32 %0, i32 %1) {
entry:
  %2 = add i32 %0, %1
  call i32 @g(i32 %2)
  call void @h(float 0x7FF8000000000000, double 0xFFF0000000000000, double 1.5)
  ret i32 %0
}",
            &types,
        )
        .unwrap();

        let printed = module.dump_to_string();
        assert!(printed.contains("  %3 = call i32 @g(i32 %2)\n"));
        assert!(printed.contains(
            "call void @h(float 0x7FF8000000000000, double 0xFFF0000000000000, double 1.5)"
        ));
        let reparsed = parse_module(&printed, &types).unwrap();
        assert_eq!(reparsed.dump_to_string(), printed);
    }

    #[test]
    fn integer_literals_must_fit_their_type() {
        let arena = Arena::new();
        let types = TypeContext::new(&arena);
        let call_with = |lit: &str| {
            parse_module(
                &format!("define void @f() {{\n  call void @g({lit})\n  ret void\n}}"),
                &types,
            )
        };

        assert!(call_with("i8 255").is_ok());
        assert!(call_with("i8 -128").is_ok());
        assert!(call_with("i1 -1").is_ok());
        assert!(call_with("i64 -9223372036854775808").is_ok());
        assert_eq!(
            call_with("i8 300").unwrap_err().t,
            ParseError::InvalidLiteral("300".into())
        );
        assert_eq!(
            call_with("i8 -129").unwrap_err().t,
            ParseError::InvalidLiteral("-129".into())
        );
        assert_eq!(
            call_with("i16 0x10000").unwrap_err().t,
            ParseError::InvalidLiteral("0x10000".into())
        );
    }
}
