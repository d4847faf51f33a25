//! Type representation for the conversion core.
//!
//! Every type is interned into a [`TypeData`] and referred to by a `TypeId`.
//! Equal structure implies equal id, so type identity is a `u32` comparison.
//! Intrinsic types are pre-registered at fixed ids (see [`IntrinsicKind`]).

use bitflags::bitflags;
use coerce_common::interner::Atom;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::def::DefId;
use crate::delegate::synthesized::SynthesizedDelegateId;

/// Interned type handle.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TypeId(pub u32);

impl TypeId {
    /// The error type.
    pub const ERROR: Self = Self(0);

    pub const VOID: Self = IntrinsicKind::Void.type_id();
    pub const OBJECT: Self = IntrinsicKind::Object.type_id();
    pub const DYNAMIC: Self = IntrinsicKind::Dynamic.type_id();
    pub const STRING: Self = IntrinsicKind::String.type_id();
    pub const BOOL: Self = IntrinsicKind::Bool.type_id();
    pub const CHAR: Self = IntrinsicKind::Char.type_id();
    pub const SBYTE: Self = IntrinsicKind::SByte.type_id();
    pub const BYTE: Self = IntrinsicKind::Byte.type_id();
    pub const SHORT: Self = IntrinsicKind::Short.type_id();
    pub const USHORT: Self = IntrinsicKind::UShort.type_id();
    pub const INT: Self = IntrinsicKind::Int.type_id();
    pub const UINT: Self = IntrinsicKind::UInt.type_id();
    pub const LONG: Self = IntrinsicKind::Long.type_id();
    pub const ULONG: Self = IntrinsicKind::ULong.type_id();
    pub const NINT: Self = IntrinsicKind::NInt.type_id();
    pub const NUINT: Self = IntrinsicKind::NUInt.type_id();
    pub const FLOAT: Self = IntrinsicKind::Float.type_id();
    pub const DOUBLE: Self = IntrinsicKind::Double.type_id();
    pub const DECIMAL: Self = IntrinsicKind::Decimal.type_id();
    pub const INTPTR: Self = IntrinsicKind::IntPtr.type_id();
    pub const UINTPTR: Self = IntrinsicKind::UIntPtr.type_id();
    pub const VALUE_TYPE: Self = IntrinsicKind::ValueType.type_id();
    pub const ENUM: Self = IntrinsicKind::Enum.type_id();
    pub const ARRAY: Self = IntrinsicKind::Array.type_id();
    pub const DELEGATE: Self = IntrinsicKind::Delegate.type_id();
    pub const MULTICAST_DELEGATE: Self = IntrinsicKind::MulticastDelegate.type_id();
    pub const EXPRESSION: Self = IntrinsicKind::Expression.type_id();
    pub const LAMBDA_EXPRESSION: Self = IntrinsicKind::LambdaExpression.type_id();
    pub const FORMATTABLE_STRING: Self = IntrinsicKind::FormattableString.type_id();
    pub const IFORMATTABLE: Self = IntrinsicKind::IFormattable.type_id();

    /// First id handed out for non-intrinsic types.
    pub const FIRST_USER: u32 = IntrinsicKind::ALL.len() as u32 + 1;

    pub const fn is_error(self) -> bool {
        self.0 == 0
    }

    pub const fn is_intrinsic(self) -> bool {
        self.0 > 0 && self.0 < Self::FIRST_USER
    }
}

/// Built-in and special types with fixed ids.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum IntrinsicKind {
    Void,
    Object,
    Dynamic,
    String,
    Bool,
    Char,
    SByte,
    Byte,
    Short,
    UShort,
    Int,
    UInt,
    Long,
    ULong,
    NInt,
    NUInt,
    Float,
    Double,
    Decimal,
    IntPtr,
    UIntPtr,
    ValueType,
    Enum,
    Array,
    Delegate,
    MulticastDelegate,
    Expression,
    LambdaExpression,
    FormattableString,
    IFormattable,
}

impl IntrinsicKind {
    pub const ALL: [Self; 30] = [
        Self::Void,
        Self::Object,
        Self::Dynamic,
        Self::String,
        Self::Bool,
        Self::Char,
        Self::SByte,
        Self::Byte,
        Self::Short,
        Self::UShort,
        Self::Int,
        Self::UInt,
        Self::Long,
        Self::ULong,
        Self::NInt,
        Self::NUInt,
        Self::Float,
        Self::Double,
        Self::Decimal,
        Self::IntPtr,
        Self::UIntPtr,
        Self::ValueType,
        Self::Enum,
        Self::Array,
        Self::Delegate,
        Self::MulticastDelegate,
        Self::Expression,
        Self::LambdaExpression,
        Self::FormattableString,
        Self::IFormattable,
    ];

    pub const fn type_id(self) -> TypeId {
        TypeId(self as u32 + 1)
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Void => "void",
            Self::Object => "object",
            Self::Dynamic => "dynamic",
            Self::String => "string",
            Self::Bool => "bool",
            Self::Char => "char",
            Self::SByte => "sbyte",
            Self::Byte => "byte",
            Self::Short => "short",
            Self::UShort => "ushort",
            Self::Int => "int",
            Self::UInt => "uint",
            Self::Long => "long",
            Self::ULong => "ulong",
            Self::NInt => "nint",
            Self::NUInt => "nuint",
            Self::Float => "float",
            Self::Double => "double",
            Self::Decimal => "decimal",
            Self::IntPtr => "IntPtr",
            Self::UIntPtr => "UIntPtr",
            Self::ValueType => "ValueType",
            Self::Enum => "Enum",
            Self::Array => "Array",
            Self::Delegate => "Delegate",
            Self::MulticastDelegate => "MulticastDelegate",
            Self::Expression => "Expression",
            Self::LambdaExpression => "LambdaExpression",
            Self::FormattableString => "FormattableString",
            Self::IFormattable => "IFormattable",
        }
    }

    /// Value types among the intrinsics (boxing rather than reference
    /// conversions apply to these).
    pub const fn is_value_type(self) -> bool {
        matches!(
            self,
            Self::Bool
                | Self::Char
                | Self::SByte
                | Self::Byte
                | Self::Short
                | Self::UShort
                | Self::Int
                | Self::UInt
                | Self::Long
                | Self::ULong
                | Self::NInt
                | Self::NUInt
                | Self::Float
                | Self::Double
                | Self::Decimal
                | Self::IntPtr
                | Self::UIntPtr
        )
    }

    /// Types participating in numeric conversions (`char` included).
    pub const fn is_numeric(self) -> bool {
        matches!(
            self,
            Self::Char
                | Self::SByte
                | Self::Byte
                | Self::Short
                | Self::UShort
                | Self::Int
                | Self::UInt
                | Self::Long
                | Self::ULong
                | Self::NInt
                | Self::NUInt
                | Self::Float
                | Self::Double
                | Self::Decimal
        )
    }

    pub const fn is_integral(self) -> bool {
        matches!(
            self,
            Self::Char
                | Self::SByte
                | Self::Byte
                | Self::Short
                | Self::UShort
                | Self::Int
                | Self::UInt
                | Self::Long
                | Self::ULong
                | Self::NInt
                | Self::NUInt
        )
    }

    pub const fn is_signed_integral(self) -> bool {
        matches!(
            self,
            Self::SByte | Self::Short | Self::Int | Self::Long | Self::NInt
        )
    }

    pub const fn is_unsigned_integral(self) -> bool {
        matches!(
            self,
            Self::Byte | Self::UShort | Self::UInt | Self::ULong | Self::NUInt
        )
    }

    pub fn from_type_id(id: TypeId) -> Option<Self> {
        if !id.is_intrinsic() {
            return None;
        }
        Self::ALL.get(id.0 as usize - 1).copied()
    }
}

/// Type parameter identifier.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeParamId(pub u32);

/// Parameter / return passing mode.
///
/// For returns, `In` means `ref readonly`.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RefKind {
    #[default]
    None,
    Ref,
    Out,
    In,
}

impl RefKind {
    pub const fn is_by_ref(self) -> bool {
        !matches!(self, Self::None)
    }

    pub const fn bits(self) -> u64 {
        match self {
            Self::None => 0,
            Self::Ref => 1,
            Self::Out => 2,
            Self::In => 3,
        }
    }

    pub const fn keyword(self) -> &'static str {
        match self {
            Self::None => "",
            Self::Ref => "ref ",
            Self::Out => "out ",
            Self::In => "in ",
        }
    }
}

/// Declared variance of a generic interface or delegate type parameter.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Variance {
    #[default]
    Invariant,
    /// `out T`
    Out,
    /// `in T`
    In,
}

bitflags! {
    /// Type parameter constraint flags.
    #[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
    pub struct ConstraintFlags: u8 {
        /// `where T : class`
        const REFERENCE_TYPE = 1 << 0;
        /// `where T : struct`
        const VALUE_TYPE = 1 << 1;
        /// `where T : unmanaged`
        const UNMANAGED = 1 << 2;
        /// `where T : new()`
        const CONSTRUCTOR = 1 << 3;
    }
}

/// Type parameter declaration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypeParamInfo {
    pub id: TypeParamId,
    pub name: Atom,
    pub variance: Variance,
    pub flags: ConstraintFlags,
    /// Constraint types (a base class and/or interfaces).
    pub constraint_types: Vec<TypeId>,
}

/// One element of a tuple type. Names do not participate in conversions but
/// do participate in type identity (and therefore in signature identity).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct TupleElement {
    pub ty: TypeId,
    pub name: Option<Atom>,
}

impl TupleElement {
    pub const fn unnamed(ty: TypeId) -> Self {
        Self { ty, name: None }
    }
}

/// One parameter of a function pointer type.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct FunctionPointerParam {
    pub ty: TypeId,
    pub ref_kind: RefKind,
}

pub type TypeArgs = SmallVec<[TypeId; 4]>;

/// Structural type representation.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TypeData {
    Error,
    Intrinsic(IntrinsicKind),
    /// A declared class, struct, interface, enum or delegate, possibly
    /// instantiated with type arguments.
    Named { def: DefId, args: TypeArgs },
    Array { element: TypeId, rank: u8 },
    Pointer(TypeId),
    FunctionPointer {
        params: SmallVec<[FunctionPointerParam; 4]>,
        return_type: TypeId,
        return_ref: RefKind,
    },
    /// `T?` for a non-nullable value type `T`.
    Nullable(TypeId),
    Tuple(SmallVec<[TupleElement; 4]>),
    TypeParameter(TypeParamId),
    /// An instantiation of a compiler-synthesized delegate type.
    Synthesized {
        delegate: SynthesizedDelegateId,
        args: TypeArgs,
    },
}

/// Declared accessibility.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Accessibility {
    Private,
    Protected,
    Internal,
    #[default]
    Public,
}

#[cfg(test)]
#[path = "../tests/types_tests.rs"]
mod tests;
