//! The closed conversion kind taxonomy.
//!
//! Every predicate is an exhaustive `match`, so adding a kind fails to
//! compile until each partition (implicit/explicit, trivial/payload-bearing)
//! has been decided for it.

use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ConversionKind {
    /// Not yet computed. Distinct from `NoConversion`.
    Unset,
    NoConversion,
    Identity,
    ImplicitNumeric,
    ImplicitEnumeration,
    ImplicitThrow,
    ImplicitTupleLiteral,
    ImplicitTuple,
    ExplicitTupleLiteral,
    ExplicitTuple,
    ImplicitNullable,
    NullLiteral,
    ImplicitReference,
    Boxing,
    ImplicitPointerToVoid,
    ImplicitNullToPointer,
    ImplicitDynamic,
    ExplicitDynamic,
    ImplicitConstant,
    ImplicitUserDefined,
    AnonymousFunction,
    MethodGroup,
    /// A lambda or method group converted through its natural function type
    /// (to `Delegate`, `object`, `Expression`, ...).
    FunctionType,
    ExplicitNumeric,
    ExplicitEnumeration,
    ExplicitNullable,
    ExplicitReference,
    Unboxing,
    ExplicitUserDefined,
    ExplicitPointerToPointer,
    ExplicitIntegerToPointer,
    ExplicitPointerToInteger,
    /// Legacy explicit conversions between `IntPtr`/`UIntPtr` and integral or
    /// pointer types.
    IntPtr,
    InterpolatedString,
    InterpolatedStringHandler,
    Deconstruction,
    StackAllocToPointerType,
    StackAllocToSpanType,
    PinnedObjectToPointer,
    DefaultLiteral,
    /// Target-typed `new(...)`.
    ObjectCreation,
    SwitchExpression,
    ConditionalExpression,
}

impl ConversionKind {
    pub const fn exists(self) -> bool {
        !matches!(self, Self::NoConversion | Self::Unset)
    }

    pub const fn is_implicit(self) -> bool {
        match self {
            Self::Identity
            | Self::ImplicitNumeric
            | Self::ImplicitEnumeration
            | Self::ImplicitThrow
            | Self::ImplicitTupleLiteral
            | Self::ImplicitTuple
            | Self::ImplicitNullable
            | Self::NullLiteral
            | Self::ImplicitReference
            | Self::Boxing
            | Self::ImplicitPointerToVoid
            | Self::ImplicitNullToPointer
            | Self::ImplicitDynamic
            | Self::ImplicitConstant
            | Self::ImplicitUserDefined
            | Self::AnonymousFunction
            | Self::MethodGroup
            | Self::FunctionType
            | Self::InterpolatedString
            | Self::InterpolatedStringHandler
            | Self::Deconstruction
            | Self::StackAllocToPointerType
            | Self::StackAllocToSpanType
            | Self::PinnedObjectToPointer
            | Self::DefaultLiteral
            | Self::ObjectCreation
            | Self::SwitchExpression
            | Self::ConditionalExpression => true,

            Self::Unset
            | Self::NoConversion
            | Self::ExplicitTupleLiteral
            | Self::ExplicitTuple
            | Self::ExplicitDynamic
            | Self::ExplicitNumeric
            | Self::ExplicitEnumeration
            | Self::ExplicitNullable
            | Self::ExplicitReference
            | Self::Unboxing
            | Self::ExplicitUserDefined
            | Self::ExplicitPointerToPointer
            | Self::ExplicitIntegerToPointer
            | Self::ExplicitPointerToInteger
            | Self::IntPtr => false,
        }
    }

    pub const fn is_explicit(self) -> bool {
        self.exists() && !self.is_implicit()
    }

    /// Kinds that must carry uncommon data (nested conversions, a resolved
    /// method, a user-defined result, deconstruction info). All other kinds
    /// must never carry it.
    pub const fn requires_payload(self) -> bool {
        match self {
            Self::ImplicitNullable
            | Self::ExplicitNullable
            | Self::ImplicitTupleLiteral
            | Self::ImplicitTuple
            | Self::ExplicitTupleLiteral
            | Self::ExplicitTuple
            | Self::ImplicitUserDefined
            | Self::ExplicitUserDefined
            | Self::MethodGroup
            | Self::Deconstruction
            | Self::SwitchExpression
            | Self::ConditionalExpression
            | Self::StackAllocToPointerType
            | Self::StackAllocToSpanType => true,

            Self::Unset
            | Self::NoConversion
            | Self::Identity
            | Self::ImplicitNumeric
            | Self::ImplicitEnumeration
            | Self::ImplicitThrow
            | Self::NullLiteral
            | Self::ImplicitReference
            | Self::Boxing
            | Self::ImplicitPointerToVoid
            | Self::ImplicitNullToPointer
            | Self::ImplicitDynamic
            | Self::ExplicitDynamic
            | Self::ImplicitConstant
            | Self::AnonymousFunction
            | Self::FunctionType
            | Self::ExplicitNumeric
            | Self::ExplicitEnumeration
            | Self::ExplicitReference
            | Self::Unboxing
            | Self::ExplicitPointerToPointer
            | Self::ExplicitIntegerToPointer
            | Self::ExplicitPointerToInteger
            | Self::IntPtr
            | Self::InterpolatedString
            | Self::InterpolatedStringHandler
            | Self::PinnedObjectToPointer
            | Self::DefaultLiteral
            | Self::ObjectCreation => false,
        }
    }

    /// Kinds whose payload is (or may be) a list of nested conversions.
    pub const fn has_nested(self) -> bool {
        matches!(
            self,
            Self::ImplicitNullable
                | Self::ExplicitNullable
                | Self::ImplicitTupleLiteral
                | Self::ImplicitTuple
                | Self::ExplicitTupleLiteral
                | Self::ExplicitTuple
                | Self::Deconstruction
                | Self::SwitchExpression
                | Self::ConditionalExpression
                | Self::StackAllocToPointerType
                | Self::StackAllocToSpanType
        )
    }

    /// Kinds a method group conversion through an indexer-like receiver may
    /// flag with the array-index bit.
    pub const fn allows_array_index(self) -> bool {
        matches!(self, Self::MethodGroup | Self::ImplicitUserDefined | Self::ExplicitUserDefined)
    }

    pub const fn is_identity(self) -> bool {
        matches!(self, Self::Identity)
    }

    pub const fn is_numeric(self) -> bool {
        matches!(self, Self::ImplicitNumeric | Self::ExplicitNumeric)
    }

    pub const fn is_enumeration(self) -> bool {
        matches!(self, Self::ImplicitEnumeration | Self::ExplicitEnumeration)
    }

    pub const fn is_nullable(self) -> bool {
        matches!(self, Self::ImplicitNullable | Self::ExplicitNullable)
    }

    pub const fn is_reference(self) -> bool {
        matches!(self, Self::ImplicitReference | Self::ExplicitReference)
    }

    pub const fn is_boxing(self) -> bool {
        matches!(self, Self::Boxing)
    }

    pub const fn is_unboxing(self) -> bool {
        matches!(self, Self::Unboxing)
    }

    pub const fn is_user_defined(self) -> bool {
        matches!(self, Self::ImplicitUserDefined | Self::ExplicitUserDefined)
    }

    pub const fn is_dynamic(self) -> bool {
        matches!(self, Self::ImplicitDynamic | Self::ExplicitDynamic)
    }

    pub const fn is_tuple(self) -> bool {
        matches!(
            self,
            Self::ImplicitTupleLiteral
                | Self::ImplicitTuple
                | Self::ExplicitTupleLiteral
                | Self::ExplicitTuple
        )
    }

    pub const fn is_pointer(self) -> bool {
        matches!(
            self,
            Self::ImplicitPointerToVoid
                | Self::ImplicitNullToPointer
                | Self::ExplicitPointerToPointer
                | Self::ExplicitIntegerToPointer
                | Self::ExplicitPointerToInteger
                | Self::StackAllocToPointerType
                | Self::PinnedObjectToPointer
        )
    }

    pub const fn is_method_group(self) -> bool {
        matches!(self, Self::MethodGroup)
    }

    pub const fn is_anonymous_function(self) -> bool {
        matches!(self, Self::AnonymousFunction)
    }

    pub const fn is_function_type(self) -> bool {
        matches!(self, Self::FunctionType)
    }

    pub const fn is_interpolated_string(self) -> bool {
        matches!(self, Self::InterpolatedString | Self::InterpolatedStringHandler)
    }

    pub const fn is_stackalloc(self) -> bool {
        matches!(self, Self::StackAllocToPointerType | Self::StackAllocToSpanType)
    }

    pub const fn is_int_ptr(self) -> bool {
        matches!(self, Self::IntPtr)
    }

    pub const fn is_constant_expression(self) -> bool {
        matches!(self, Self::ImplicitConstant)
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Unset => "Unset",
            Self::NoConversion => "NoConversion",
            Self::Identity => "Identity",
            Self::ImplicitNumeric => "ImplicitNumeric",
            Self::ImplicitEnumeration => "ImplicitEnumeration",
            Self::ImplicitThrow => "ImplicitThrow",
            Self::ImplicitTupleLiteral => "ImplicitTupleLiteral",
            Self::ImplicitTuple => "ImplicitTuple",
            Self::ExplicitTupleLiteral => "ExplicitTupleLiteral",
            Self::ExplicitTuple => "ExplicitTuple",
            Self::ImplicitNullable => "ImplicitNullable",
            Self::NullLiteral => "NullLiteral",
            Self::ImplicitReference => "ImplicitReference",
            Self::Boxing => "Boxing",
            Self::ImplicitPointerToVoid => "ImplicitPointerToVoid",
            Self::ImplicitNullToPointer => "ImplicitNullToPointer",
            Self::ImplicitDynamic => "ImplicitDynamic",
            Self::ExplicitDynamic => "ExplicitDynamic",
            Self::ImplicitConstant => "ImplicitConstant",
            Self::ImplicitUserDefined => "ImplicitUserDefined",
            Self::AnonymousFunction => "AnonymousFunction",
            Self::MethodGroup => "MethodGroup",
            Self::FunctionType => "FunctionType",
            Self::ExplicitNumeric => "ExplicitNumeric",
            Self::ExplicitEnumeration => "ExplicitEnumeration",
            Self::ExplicitNullable => "ExplicitNullable",
            Self::ExplicitReference => "ExplicitReference",
            Self::Unboxing => "Unboxing",
            Self::ExplicitUserDefined => "ExplicitUserDefined",
            Self::ExplicitPointerToPointer => "ExplicitPointerToPointer",
            Self::ExplicitIntegerToPointer => "ExplicitIntegerToPointer",
            Self::ExplicitPointerToInteger => "ExplicitPointerToInteger",
            Self::IntPtr => "IntPtr",
            Self::InterpolatedString => "InterpolatedString",
            Self::InterpolatedStringHandler => "InterpolatedStringHandler",
            Self::Deconstruction => "Deconstruction",
            Self::StackAllocToPointerType => "StackAllocToPointerType",
            Self::StackAllocToSpanType => "StackAllocToSpanType",
            Self::PinnedObjectToPointer => "PinnedObjectToPointer",
            Self::DefaultLiteral => "DefaultLiteral",
            Self::ObjectCreation => "ObjectCreation",
            Self::SwitchExpression => "SwitchExpression",
            Self::ConditionalExpression => "ConditionalExpression",
        }
    }

    pub const ALL: [Self; 43] = [
        Self::Unset,
        Self::NoConversion,
        Self::Identity,
        Self::ImplicitNumeric,
        Self::ImplicitEnumeration,
        Self::ImplicitThrow,
        Self::ImplicitTupleLiteral,
        Self::ImplicitTuple,
        Self::ExplicitTupleLiteral,
        Self::ExplicitTuple,
        Self::ImplicitNullable,
        Self::NullLiteral,
        Self::ImplicitReference,
        Self::Boxing,
        Self::ImplicitPointerToVoid,
        Self::ImplicitNullToPointer,
        Self::ImplicitDynamic,
        Self::ExplicitDynamic,
        Self::ImplicitConstant,
        Self::ImplicitUserDefined,
        Self::AnonymousFunction,
        Self::MethodGroup,
        Self::FunctionType,
        Self::ExplicitNumeric,
        Self::ExplicitEnumeration,
        Self::ExplicitNullable,
        Self::ExplicitReference,
        Self::Unboxing,
        Self::ExplicitUserDefined,
        Self::ExplicitPointerToPointer,
        Self::ExplicitIntegerToPointer,
        Self::ExplicitPointerToInteger,
        Self::IntPtr,
        Self::InterpolatedString,
        Self::InterpolatedStringHandler,
        Self::Deconstruction,
        Self::StackAllocToPointerType,
        Self::StackAllocToSpanType,
        Self::PinnedObjectToPointer,
        Self::DefaultLiteral,
        Self::ObjectCreation,
        Self::SwitchExpression,
        Self::ConditionalExpression,
    ];
}

impl std::fmt::Display for ConversionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
#[path = "../../tests/conversion_kind_tests.rs"]
mod tests;
