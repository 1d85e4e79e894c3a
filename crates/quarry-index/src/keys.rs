use quarry_hir::{SuperPosition, TypeKind};
use serde::{Deserialize, Serialize};

/// The index namespaces a key can live in.
///
/// `Ref` is shared by unqualified field and variable references: at indexing
/// time a bare name cannot be attributed to either kind, so both reference
/// patterns query the same namespace and re-validate decoded keys themselves.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum IndexCategory {
    TypeDecl,
    TypeRef,
    FieldDecl,
    MethodDecl,
    MethodRef,
    Ref,
    VarDecl,
    SuperRef,
    PackageDecl,
    PackageRef,
}

impl IndexCategory {
    pub const ALL: [IndexCategory; 10] = [
        IndexCategory::TypeDecl,
        IndexCategory::TypeRef,
        IndexCategory::FieldDecl,
        IndexCategory::MethodDecl,
        IndexCategory::MethodRef,
        IndexCategory::Ref,
        IndexCategory::VarDecl,
        IndexCategory::SuperRef,
        IndexCategory::PackageDecl,
        IndexCategory::PackageRef,
    ];
}

/// Field separator inside encoded keys. Java identifiers cannot contain it,
/// which keeps every codec injective. Public so the pattern model can build
/// partial keys (e.g. `selector/` as a prefix probe) with the codec's own
/// separator.
pub const SEPARATOR: char = '/';

/// A key carrying a single name (type refs, field decls, unqualified refs,
/// variable decls).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SimpleKey {
    pub name: String,
}

impl SimpleKey {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn encode(&self) -> Vec<u8> {
        self.name.clone().into_bytes()
    }
}

/// `simpleName/package/kindTag`, e.g. `Foo/com.example/c`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeDeclKey {
    pub simple_name: String,
    /// Dotted package; empty for the unnamed package.
    pub package: String,
    pub kind: TypeKind,
}

impl TypeDeclKey {
    pub fn encode(&self) -> Vec<u8> {
        format!(
            "{}{SEPARATOR}{}{SEPARATOR}{}",
            self.simple_name,
            self.package,
            kind_tag(self.kind)
        )
        .into_bytes()
    }
}

/// `selector/parameterCount`, e.g. `put/2`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodKey {
    pub selector: String,
    pub param_count: u32,
}

impl MethodKey {
    pub fn encode(&self) -> Vec<u8> {
        format!("{}{SEPARATOR}{}", self.selector, self.param_count).into_bytes()
    }
}

/// `superSimpleName/subSimpleName/positionTag`, e.g. `List/ArrayList/i`.
///
/// The position tag records whether the written clause occupies a superclass
/// or superinterface slot (an interface's `extends` entries are interface
/// positions).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SuperRefKey {
    pub super_simple_name: String,
    pub sub_simple_name: String,
    pub position: SuperPosition,
}

impl SuperRefKey {
    /// Prefix probe covering every subtype/position under one super name.
    pub fn super_prefix(super_simple_name: &str) -> Vec<u8> {
        format!("{super_simple_name}{SEPARATOR}").into_bytes()
    }

    pub fn encode(&self) -> Vec<u8> {
        let tag = match self.position {
            SuperPosition::Class => 'c',
            SuperPosition::Interface => 'i',
        };
        format!(
            "{}{SEPARATOR}{}{SEPARATOR}{tag}",
            self.super_simple_name, self.sub_simple_name
        )
        .into_bytes()
    }
}

/// A dotted package name, stored verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PackageKey {
    pub name: String,
}

impl PackageKey {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn encode(&self) -> Vec<u8> {
        self.name.clone().into_bytes()
    }
}

/// A key decoded back out of its category's raw bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DecodedKey {
    Simple(SimpleKey),
    Type(TypeDeclKey),
    Method(MethodKey),
    Super(SuperRefKey),
    Package(PackageKey),
}

/// Decodes `key` as `category` dictates. A malformed key is a mismatch, not
/// an error: the caller treats `None` as "no match".
pub fn decode_key(category: IndexCategory, key: &[u8]) -> Option<DecodedKey> {
    let text = std::str::from_utf8(key).ok()?;
    match category {
        IndexCategory::TypeRef
        | IndexCategory::FieldDecl
        | IndexCategory::Ref
        | IndexCategory::VarDecl => {
            if text.contains(SEPARATOR) {
                return None;
            }
            Some(DecodedKey::Simple(SimpleKey::new(text)))
        }
        IndexCategory::TypeDecl => {
            let mut parts = text.splitn(3, SEPARATOR);
            let simple_name = parts.next()?.to_string();
            let package = parts.next()?.to_string();
            let kind = parse_kind_tag(parts.next()?)?;
            Some(DecodedKey::Type(TypeDeclKey {
                simple_name,
                package,
                kind,
            }))
        }
        IndexCategory::MethodDecl | IndexCategory::MethodRef => {
            let (selector, count) = text.split_once(SEPARATOR)?;
            let param_count: u32 = count.parse().ok()?;
            Some(DecodedKey::Method(MethodKey {
                selector: selector.to_string(),
                param_count,
            }))
        }
        IndexCategory::SuperRef => {
            let mut parts = text.splitn(3, SEPARATOR);
            let super_simple_name = parts.next()?.to_string();
            let sub_simple_name = parts.next()?.to_string();
            let position = match parts.next()? {
                "c" => SuperPosition::Class,
                "i" => SuperPosition::Interface,
                _ => return None,
            };
            Some(DecodedKey::Super(SuperRefKey {
                super_simple_name,
                sub_simple_name,
                position,
            }))
        }
        IndexCategory::PackageDecl | IndexCategory::PackageRef => {
            if text.contains(SEPARATOR) {
                return None;
            }
            Some(DecodedKey::Package(PackageKey::new(text)))
        }
    }
}

fn kind_tag(kind: TypeKind) -> char {
    match kind {
        TypeKind::Class => 'c',
        TypeKind::Interface => 'i',
        TypeKind::Enum => 'e',
        TypeKind::Annotation => 'a',
    }
}

fn parse_kind_tag(tag: &str) -> Option<TypeKind> {
    match tag {
        "c" => Some(TypeKind::Class),
        "i" => Some(TypeKind::Interface),
        "e" => Some(TypeKind::Enum),
        "a" => Some(TypeKind::Annotation),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_decl_key_round_trips() {
        let key = TypeDeclKey {
            simple_name: "Foo".into(),
            package: "com.example".into(),
            kind: TypeKind::Interface,
        };
        let decoded = decode_key(IndexCategory::TypeDecl, &key.encode());
        assert_eq!(decoded, Some(DecodedKey::Type(key)));
    }

    #[test]
    fn type_decl_key_round_trips_in_unnamed_package() {
        let key = TypeDeclKey {
            simple_name: "Foo".into(),
            package: String::new(),
            kind: TypeKind::Class,
        };
        let decoded = decode_key(IndexCategory::TypeDecl, &key.encode());
        assert_eq!(decoded, Some(DecodedKey::Type(key)));
    }

    #[test]
    fn method_key_round_trips() {
        let key = MethodKey {
            selector: "put".into(),
            param_count: 2,
        };
        let decoded = decode_key(IndexCategory::MethodRef, &key.encode());
        assert_eq!(decoded, Some(DecodedKey::Method(key)));
    }

    #[test]
    fn super_ref_key_round_trips() {
        let key = SuperRefKey {
            super_simple_name: "List".into(),
            sub_simple_name: "ArrayList".into(),
            position: SuperPosition::Interface,
        };
        let decoded = decode_key(IndexCategory::SuperRef, &key.encode());
        assert_eq!(decoded, Some(DecodedKey::Super(key)));
    }

    #[test]
    fn simple_and_package_keys_round_trip() {
        let simple = SimpleKey::new("value");
        assert_eq!(
            decode_key(IndexCategory::Ref, &simple.encode()),
            Some(DecodedKey::Simple(simple))
        );
        let pkg = PackageKey::new("com.example.util");
        assert_eq!(
            decode_key(IndexCategory::PackageDecl, &pkg.encode()),
            Some(DecodedKey::Package(pkg))
        );
    }

    #[test]
    fn malformed_keys_decode_to_none() {
        assert_eq!(decode_key(IndexCategory::MethodDecl, b"noCount"), None);
        assert_eq!(decode_key(IndexCategory::MethodDecl, b"sel/notANumber"), None);
        assert_eq!(decode_key(IndexCategory::TypeDecl, b"Foo/pkg/x"), None);
        assert_eq!(decode_key(IndexCategory::SuperRef, b"Only/two"), None);
        assert_eq!(decode_key(IndexCategory::Ref, b"has/separator"), None);
        assert_eq!(decode_key(IndexCategory::Ref, &[0xFF, 0xFE]), None);
    }
}
