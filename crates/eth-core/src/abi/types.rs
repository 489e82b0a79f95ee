use std::fmt;
use std::str::FromStr;

use alloy_primitives::{I256, U256};

use crate::abi::value::AbiValue;
use crate::abi::WORD;
use crate::address::Address;
use crate::error::EthError;

/// A Solidity ABI type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AbiType {
    /// `uintN`, N in 8..=256, multiple of 8.
    Uint(usize),
    /// `intN`, N in 8..=256, multiple of 8.
    Int(usize),
    Address,
    Bool,
    /// `bytesN`, N in 1..=32.
    FixedBytes(usize),
    Bytes,
    String,
    /// `T[k]`, k > 0.
    FixedArray(Box<AbiType>, usize),
    /// `T[]`.
    Array(Box<AbiType>),
    /// `(T1,...,Tn)`.
    Tuple(Vec<AbiType>),
}

impl AbiType {
    /// Parses a type signature such as `uint256`, `bytes32[]`,
    /// `(address,uint)[2]` or `tuple(bool,string)`.
    ///
    /// Whitespace is ignored and `uint`/`int`/`byte` expand to
    /// `uint256`/`int256`/`bytes1`.
    pub fn parse(signature: &str) -> Result<Self, EthError> {
        let compact: String = signature.chars().filter(|c| !c.is_whitespace()).collect();
        if compact.is_empty() {
            return Err(EthError::InvalidAbiType("empty type".into()));
        }
        parse_compact(&compact)
    }

    /// Dynamic types are encoded out of line, behind an offset.
    pub fn is_dynamic(&self) -> bool {
        match self {
            AbiType::Bytes | AbiType::String | AbiType::Array(_) => true,
            AbiType::FixedArray(elem, _) => elem.is_dynamic(),
            AbiType::Tuple(fields) => fields.iter().any(AbiType::is_dynamic),
            _ => false,
        }
    }

    /// Bytes this type occupies in the head of an enclosing sequence.
    ///
    /// Saturates at `usize::MAX` for absurdly large fixed arrays, which no
    /// buffer can satisfy.
    pub fn head_size(&self) -> usize {
        if self.is_dynamic() {
            return WORD;
        }
        match self {
            AbiType::FixedArray(elem, size) => {
                elem.head_size().checked_mul(*size).unwrap_or(usize::MAX)
            }
            AbiType::Tuple(fields) => fields
                .iter()
                .map(AbiType::head_size)
                .fold(0, usize::saturating_add),
            _ => WORD,
        }
    }

    /// The canonical empty value: zero numbers, empty strings and arrays,
    /// zero-filled fixed arrays and tuples.
    pub fn empty_value(&self) -> AbiValue {
        match self {
            AbiType::Uint(_) => AbiValue::Uint(U256::ZERO),
            AbiType::Int(_) => AbiValue::Int(I256::ZERO),
            AbiType::Address => AbiValue::Address(Address::ZERO),
            AbiType::Bool => AbiValue::Bool(false),
            AbiType::FixedBytes(size) => AbiValue::FixedBytes(vec![0u8; *size]),
            AbiType::Bytes => AbiValue::Bytes(Vec::new()),
            AbiType::String => AbiValue::String(String::new()),
            AbiType::FixedArray(elem, size) => {
                AbiValue::FixedArray((0..*size).map(|_| elem.empty_value()).collect())
            }
            AbiType::Array(_) => AbiValue::Array(Vec::new()),
            AbiType::Tuple(fields) => {
                AbiValue::Tuple(fields.iter().map(AbiType::empty_value).collect())
            }
        }
    }

    /// Whether an indexed event parameter of this type is stored as-is in
    /// its topic (as opposed to a Keccak-256 hash).
    pub fn is_value_type(&self) -> bool {
        matches!(
            self,
            AbiType::Uint(_)
                | AbiType::Int(_)
                | AbiType::Address
                | AbiType::Bool
                | AbiType::FixedBytes(_)
        )
    }
}

impl FromStr for AbiType {
    type Err = EthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AbiType::parse(s)
    }
}

impl fmt::Display for AbiType {
    /// Canonical form used in function and event signatures.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AbiType::Uint(bits) => write!(f, "uint{bits}"),
            AbiType::Int(bits) => write!(f, "int{bits}"),
            AbiType::Address => f.write_str("address"),
            AbiType::Bool => f.write_str("bool"),
            AbiType::FixedBytes(size) => write!(f, "bytes{size}"),
            AbiType::Bytes => f.write_str("bytes"),
            AbiType::String => f.write_str("string"),
            AbiType::FixedArray(elem, size) => write!(f, "{elem}[{size}]"),
            AbiType::Array(elem) => write!(f, "{elem}[]"),
            AbiType::Tuple(fields) => {
                f.write_str("(")?;
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{field}")?;
                }
                f.write_str(")")
            }
        }
    }
}

/// Applies array suffixes such as `[2][]` to a base type, left to right.
pub(crate) fn apply_array_suffix(base: AbiType, suffix: &str) -> Result<AbiType, EthError> {
    let mut ty = base;
    let mut rest = suffix;
    while !rest.is_empty() {
        let inner = rest
            .strip_prefix('[')
            .and_then(|r| r.find(']').map(|end| (&r[..end], &r[end + 1..])));
        let (size, remaining) = inner
            .ok_or_else(|| EthError::InvalidAbiType(format!("malformed array suffix {suffix}")))?;
        ty = array_of(ty, size)?;
        rest = remaining;
    }
    Ok(ty)
}

fn parse_compact(s: &str) -> Result<AbiType, EthError> {
    if s.ends_with(']') {
        let open = s
            .rfind('[')
            .ok_or_else(|| EthError::InvalidAbiType(format!("unbalanced brackets in {s}")))?;
        let elem = parse_compact(&s[..open])?;
        return array_of(elem, &s[open + 1..s.len() - 1]);
    }

    if let Some(body) = s.strip_prefix("tuple(").or_else(|| s.strip_prefix('(')) {
        let body = body
            .strip_suffix(')')
            .ok_or_else(|| EthError::InvalidAbiType(format!("unbalanced parentheses in {s}")))?;
        if body.is_empty() {
            return Err(EthError::InvalidAbiType(format!("{s}: tuple has no fields")));
        }
        let fields = split_top_level(body)?
            .into_iter()
            .map(parse_compact)
            .collect::<Result<Vec<_>, _>>()?;
        return Ok(AbiType::Tuple(fields));
    }

    match s {
        "address" => return Ok(AbiType::Address),
        "bool" => return Ok(AbiType::Bool),
        "string" => return Ok(AbiType::String),
        "bytes" => return Ok(AbiType::Bytes),
        "uint" => return Ok(AbiType::Uint(256)),
        "int" => return Ok(AbiType::Int(256)),
        "byte" => return Ok(AbiType::FixedBytes(1)),
        "function" => {
            return Err(EthError::InvalidAbiType("function type is not supported".into()))
        }
        _ => {}
    }

    if let Some(bits) = s.strip_prefix("uint") {
        return Ok(AbiType::Uint(parse_bits(s, bits)?));
    }
    if let Some(bits) = s.strip_prefix("int") {
        return Ok(AbiType::Int(parse_bits(s, bits)?));
    }
    if let Some(size) = s.strip_prefix("bytes") {
        let size = parse_number(s, size)?;
        if !(1..=32).contains(&size) {
            return Err(EthError::InvalidAbiType(format!("{s}: size must be 1..=32")));
        }
        return Ok(AbiType::FixedBytes(size));
    }

    Err(EthError::InvalidAbiType(format!("unknown type {s}")))
}

fn array_of(elem: AbiType, size: &str) -> Result<AbiType, EthError> {
    if size.is_empty() {
        return Ok(AbiType::Array(Box::new(elem)));
    }
    let len = parse_number(size, size)?;
    if len == 0 {
        return Err(EthError::InvalidAbiType(format!(
            "{elem}[0]: fixed array length must be positive"
        )));
    }
    Ok(AbiType::FixedArray(Box::new(elem), len))
}

fn parse_bits(ty: &str, digits: &str) -> Result<usize, EthError> {
    let bits = parse_number(ty, digits)?;
    if bits == 0 || bits > 256 || bits % 8 != 0 {
        return Err(EthError::InvalidAbiType(format!(
            "{ty}: width must be a multiple of 8 in 8..=256"
        )));
    }
    Ok(bits)
}

fn parse_number(ty: &str, digits: &str) -> Result<usize, EthError> {
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(EthError::InvalidAbiType(format!("unknown type {ty}")));
    }
    digits
        .parse()
        .map_err(|e| EthError::InvalidAbiType(format!("{ty}: {e}")))
}

/// Splits on commas that are not nested inside parentheses or brackets.
pub(crate) fn split_top_level(s: &str) -> Result<Vec<&str>, EthError> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;

    for (i, c) in s.char_indices() {
        match c {
            '(' | '[' => depth += 1,
            ')' | ']' => {
                depth -= 1;
                if depth < 0 {
                    return Err(EthError::InvalidAbiType(format!("unbalanced {s}")));
                }
            }
            ',' if depth == 0 => {
                parts.push(&s[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    if depth != 0 {
        return Err(EthError::InvalidAbiType(format!("unbalanced {s}")));
    }
    parts.push(&s[start..]);

    if parts.iter().any(|p| p.is_empty()) {
        return Err(EthError::InvalidAbiType(format!("empty type in list {s}")));
    }
    Ok(parts)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> AbiType {
        AbiType::parse(s).unwrap()
    }

    #[test]
    fn elementary_types() {
        assert_eq!(parse("uint256"), AbiType::Uint(256));
        assert_eq!(parse("int8"), AbiType::Int(8));
        assert_eq!(parse("address"), AbiType::Address);
        assert_eq!(parse("bool"), AbiType::Bool);
        assert_eq!(parse("bytes32"), AbiType::FixedBytes(32));
        assert_eq!(parse("bytes"), AbiType::Bytes);
        assert_eq!(parse("string"), AbiType::String);
    }

    #[test]
    fn aliases_expand() {
        assert_eq!(parse("uint"), AbiType::Uint(256));
        assert_eq!(parse("int"), AbiType::Int(256));
        assert_eq!(parse("byte"), AbiType::FixedBytes(1));
    }

    #[test]
    fn arrays_nest_left_to_right() {
        assert_eq!(
            parse("uint256[2][]"),
            AbiType::Array(Box::new(AbiType::FixedArray(Box::new(AbiType::Uint(256)), 2)))
        );
        assert_eq!(parse("address[]").to_string(), "address[]");
    }

    #[test]
    fn tuples_parse_with_or_without_keyword() {
        let expected = AbiType::Tuple(vec![AbiType::Address, AbiType::Uint(256)]);
        assert_eq!(parse("(address,uint256)"), expected);
        assert_eq!(parse("tuple(address, uint)"), expected);
        assert_eq!(
            parse("(bool,(string,bytes4)[])[3]").to_string(),
            "(bool,(string,bytes4)[])[3]"
        );
    }

    #[test]
    fn empty_tuple_rejected() {
        for bad in ["()", "tuple()", "()[]", "(uint256,())"] {
            assert!(
                matches!(AbiType::parse(bad), Err(EthError::InvalidAbiType(_))),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn head_size_saturates_for_huge_fixed_arrays() {
        let ty = parse(&format!("uint256[{}][4]", usize::MAX / 2));
        assert_eq!(ty.head_size(), usize::MAX);
        assert_eq!(parse("uint256[3]").head_size(), 96);
    }

    #[test]
    fn whitespace_is_ignored() {
        assert_eq!(parse(" uint 256 [ ] "), parse("uint256[]"));
    }

    #[test]
    fn invalid_widths_rejected() {
        for bad in ["uint7", "uint264", "uint0", "int9", "bytes0", "bytes33", "uint+8"] {
            assert!(
                matches!(AbiType::parse(bad), Err(EthError::InvalidAbiType(_))),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn unsupported_and_malformed_rejected() {
        for bad in ["function", "uint256[0]", "uint256[", "(uint256", "(uint256,)", "float", ""] {
            assert!(AbiType::parse(bad).is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn dynamic_classification() {
        assert!(!parse("uint256").is_dynamic());
        assert!(!parse("bytes32[4]").is_dynamic());
        assert!(!parse("(address,bool)").is_dynamic());
        assert!(parse("bytes").is_dynamic());
        assert!(parse("string").is_dynamic());
        assert!(parse("uint8[]").is_dynamic());
        assert!(parse("string[2]").is_dynamic());
        assert!(parse("(uint256,string)").is_dynamic());
    }

    #[test]
    fn head_sizes() {
        assert_eq!(parse("uint256").head_size(), 32);
        assert_eq!(parse("uint256[3]").head_size(), 96);
        assert_eq!(parse("(address,uint256[2])").head_size(), 96);
        assert_eq!(parse("string[2]").head_size(), 32);
    }

    #[test]
    fn array_suffix_helper() {
        let ty = apply_array_suffix(AbiType::Bool, "[2][]").unwrap();
        assert_eq!(ty.to_string(), "bool[2][]");
        assert!(apply_array_suffix(AbiType::Bool, "[2").is_err());
    }

    #[test]
    fn empty_values() {
        assert_eq!(parse("string").empty_value(), AbiValue::String(String::new()));
        assert_eq!(parse("bytes2").empty_value(), AbiValue::FixedBytes(vec![0, 0]));
        assert_eq!(
            parse("bool[2]").empty_value(),
            AbiValue::FixedArray(vec![AbiValue::Bool(false), AbiValue::Bool(false)])
        );
    }
}
