use std::collections::{HashMap, HashSet};

use crate::utils::CommaSeparated;

use super::{Function, InstKind, InstRef, Module, ValueRef};

/// Printed names of the value-producing instructions that carry none. Each is the first
/// number, counting up in program order, that no argument or named instruction uses.
struct SlotNames(HashMap<InstRef, String>);
impl SlotNames {
    fn of(func: &Function<'_>) -> Self {
        let taken = func
            .args
            .iter()
            .map(|a| a.name.as_str())
            .chain(func.instructions().filter_map(|x| func.inst(x).name.as_deref()))
            .collect::<HashSet<_>>();

        let mut next = 0usize;
        let mut names = HashMap::new();
        for x in func.instructions() {
            let data = func.inst(x);
            if data.name.is_some() || data.ty.is_void() {
                continue;
            }
            let name = loop {
                let candidate = next.to_string();
                next += 1;
                if !taken.contains(candidate.as_str()) {
                    break candidate;
                }
            };
            names.insert(x, name);
        }

        Self(names)
    }
}

struct ValueName<'f, 't>(&'f Function<'t>, &'f SlotNames, ValueRef);
impl core::fmt::Display for ValueName<'_, '_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let Self(func, slots, v) = *self;

        match v {
            ValueRef::Arg(n) => write!(f, "%{}", func.args[n].name),
            ValueRef::Inst(r) => match (&func.inst(r).name, slots.0.get(&r)) {
                (Some(name), _) | (None, Some(name)) => write!(f, "%{name}"),
                // void results are never referenced
                (None, None) => write!(f, "%{}", r.0),
            },
            ValueRef::Const(c) => func.constant_data(c).write_literal(f),
        }
    }
}

struct TypedValue<'f, 't>(&'f Function<'t>, &'f SlotNames, ValueRef);
impl core::fmt::Display for TypedValue<'_, '_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let Self(func, slots, v) = *self;

        write!(f, "{} {}", func.value_type(v), ValueName(func, slots, v))
    }
}

impl<'t> Function<'t> {
    pub fn dump_instruction(
        &self,
        inst: InstRef,
        w: &mut (impl std::io::Write + ?Sized),
    ) -> std::io::Result<()> {
        self.write_instruction(&SlotNames::of(self), inst, w)
    }

    fn write_instruction(
        &self,
        slots: &SlotNames,
        inst: InstRef,
        w: &mut (impl std::io::Write + ?Sized),
    ) -> std::io::Result<()> {
        let data = self.inst(inst);
        let operands = data
            .operands
            .iter()
            .map(|&x| TypedValue(self, slots, x))
            .collect::<Vec<_>>();
        let value = |n: usize| ValueName(self, slots, data.operands[n]);

        if !data.ty.is_void() {
            write!(w, "{} = ", ValueName(self, slots, ValueRef::Inst(inst)))?;
        }
        match data.kind {
            InstKind::Call { ref callee, .. } => write!(
                w,
                "call {} @{callee}({})",
                data.ty,
                CommaSeparated(&operands)
            ),
            InstKind::Binary(op) => write!(w, "{} {} {}, {}", op.name(), data.ty, value(0), value(1)),
            InstKind::Select => write!(w, "select {}", CommaSeparated(&operands)),
            InstKind::BitCast => write!(w, "bitcast {} to {}", operands[0], data.ty),
            InstKind::Ret if operands.is_empty() => write!(w, "ret void"),
            InstKind::Ret => write!(w, "ret {}", operands[0]),
            InstKind::Br(target) => write!(w, "br label %{}", self.block(target).label),
            InstKind::CondBr {
                then_block,
                else_block,
            } => write!(
                w,
                "br {}, label %{}, label %{}",
                operands[0],
                self.block(then_block).label,
                self.block(else_block).label
            ),
        }
    }

    pub fn dump(&self, w: &mut (impl std::io::Write + ?Sized)) -> std::io::Result<()> {
        let args = self
            .args
            .iter()
            .map(|a| format!("{} %{}", a.ty, a.name))
            .collect::<Vec<_>>();
        writeln!(
            w,
            "define {} @{}({}) {{",
            self.return_type,
            self.name,
            CommaSeparated(&args)
        )?;
        let slots = SlotNames::of(self);
        for b in self.blocks.iter() {
            writeln!(w, "{}:", b.label)?;
            for &x in b.instructions.iter() {
                write!(w, "  ")?;
                self.write_instruction(&slots, x, w)?;
                writeln!(w)?;
            }
        }
        writeln!(w, "}}")
    }

    pub fn dump_to_string(&self) -> String {
        let mut sink = Vec::new();
        // writing into a Vec cannot fail
        let _ = self.dump(&mut sink);
        String::from_utf8_lossy(&sink).into_owned()
    }

    /// `<type> <name or literal>`, as the value appears in an operand list.
    pub fn value_to_string(&self, v: ValueRef) -> String {
        TypedValue(self, &SlotNames::of(self), v).to_string()
    }

    pub fn instruction_to_string(&self, inst: InstRef) -> String {
        let mut sink = Vec::new();
        let _ = self.dump_instruction(inst, &mut sink);
        String::from_utf8_lossy(&sink).into_owned()
    }
}

impl Module<'_> {
    pub fn dump(&self, w: &mut (impl std::io::Write + ?Sized)) -> std::io::Result<()> {
        for (n, f) in self.functions.iter().enumerate() {
            if n > 0 {
                writeln!(w)?;
            }
            f.dump(w)?;
        }

        Ok(())
    }

    pub fn dump_to_string(&self) -> String {
        let mut sink = Vec::new();
        let _ = self.dump(&mut sink);
        String::from_utf8_lossy(&sink).into_owned()
    }
}
