//! Source-like rendering of types and methods.

use std::fmt::Write;

use crate::compilation::Compilation;
use crate::delegate::signature::DelegateSignature;
use crate::method::MethodId;
use crate::types::{TypeData, TypeId};

pub struct TypeFormatter<'a> {
    comp: &'a Compilation,
}

impl<'a> TypeFormatter<'a> {
    pub fn new(comp: &'a Compilation) -> Self {
        Self { comp }
    }

    pub fn format(&self, ty: TypeId) -> String {
        let mut out = String::new();
        self.write_type(&mut out, ty);
        out
    }

    pub fn format_list(&self, types: &[TypeId]) -> String {
        let mut out = String::new();
        self.write_list(&mut out, types);
        out
    }

    /// `Name<T>(int, ref string)`
    pub fn format_method(&self, method: MethodId) -> String {
        let Some(info) = self.comp.methods().get(method) else {
            return format!("<method {}>", method.0);
        };
        let mut out = self.comp.name_of(info.name).to_string();
        if !info.type_params.is_empty() {
            let params = self.comp.types().type_param_types(&info.type_params);
            out.push('<');
            self.write_list(&mut out, &params);
            out.push('>');
        }
        out.push('(');
        for (i, param) in info.params.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            if param.is_params {
                out.push_str("params ");
            }
            out.push_str(param.ref_kind.keyword());
            self.write_type(&mut out, param.ty);
        }
        out.push(')');
        out
    }

    /// `ref int (int, out string)`
    pub fn format_signature(&self, signature: &DelegateSignature) -> String {
        let mut out = String::new();
        out.push_str(signature.return_ref.keyword());
        self.write_type(&mut out, signature.return_type);
        out.push_str(" (");
        for (i, param) in signature.params.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            if param.is_params {
                out.push_str("params ");
            }
            out.push_str(param.ref_kind.keyword());
            self.write_type(&mut out, param.ty);
        }
        out.push(')');
        out
    }

    fn write_list(&self, out: &mut String, types: &[TypeId]) {
        for (i, &ty) in types.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            self.write_type(out, ty);
        }
    }

    fn write_type(&self, out: &mut String, ty: TypeId) {
        let Some(data) = self.comp.types().lookup(ty) else {
            let _ = write!(out, "<type {}>", ty.0);
            return;
        };
        match data {
            TypeData::Error => out.push('?'),
            TypeData::Intrinsic(kind) => out.push_str(kind.name()),
            TypeData::Named { def, args } => {
                match self.comp.defs().get(def) {
                    Some(info) => out.push_str(&self.comp.name_of(info.name)),
                    None => {
                        let _ = write!(out, "<def {}>", def.0);
                    }
                }
                if !args.is_empty() {
                    out.push('<');
                    self.write_list(out, &args);
                    out.push('>');
                }
            }
            TypeData::Array { element, rank } => {
                self.write_type(out, element);
                out.push('[');
                for _ in 1..rank {
                    out.push(',');
                }
                out.push(']');
            }
            TypeData::Pointer(pointee) => {
                self.write_type(out, pointee);
                out.push('*');
            }
            TypeData::FunctionPointer {
                params,
                return_type,
                return_ref,
            } => {
                out.push_str("delegate*<");
                for param in &params {
                    out.push_str(param.ref_kind.keyword());
                    self.write_type(out, param.ty);
                    out.push_str(", ");
                }
                out.push_str(return_ref.keyword());
                self.write_type(out, return_type);
                out.push('>');
            }
            TypeData::Nullable(underlying) => {
                self.write_type(out, underlying);
                out.push('?');
            }
            TypeData::Tuple(elements) => {
                out.push('(');
                for (i, element) in elements.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    self.write_type(out, element.ty);
                    if let Some(name) = element.name {
                        out.push(' ');
                        out.push_str(&self.comp.name_of(name));
                    }
                }
                out.push(')');
            }
            TypeData::TypeParameter(id) => match self.comp.types().type_param_info(id) {
                Some(info) => out.push_str(&self.comp.name_of(info.name)),
                None => {
                    let _ = write!(out, "<T{}>", id.0);
                }
            },
            TypeData::Synthesized { delegate, args } => {
                match self.comp.synthesized().get(delegate) {
                    Some(info) => out.push_str(&info.name),
                    None => {
                        let _ = write!(out, "<synthesized {}>", delegate.0);
                    }
                }
                if !args.is_empty() {
                    out.push('<');
                    self.write_list(out, &args);
                    out.push('>');
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "../tests/format_tests.rs"]
mod tests;
