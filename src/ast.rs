use serde::{Deserialize, Serialize};

use crate::diagnostics::Span;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Module {
    pub name: String,
    #[serde(default)]
    pub decls: Vec<TypeDecl>,
}

impl Module {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            decls: Vec::new(),
        }
    }

    pub fn with_decl(mut self, decl: TypeDecl) -> Self {
        self.decls.push(decl);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeDecl {
    pub name: String,
    /// Dot-separated namespace, empty for the root namespace.
    #[serde(default)]
    pub namespace: String,
    #[serde(flatten)]
    pub kind: DeclKind,
    #[serde(default)]
    pub span: Option<Span>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decl", rename_all = "snake_case")]
pub enum DeclKind {
    Constant {
        #[serde(default)]
        derived: bool,
    },
    Constructor {
        #[serde(default)]
        derived: bool,
        args: Vec<TypeExpr>,
    },
    Map {
        domain: Vec<TypeExpr>,
        codomain: Vec<TypeExpr>,
    },
    Union {
        def: TypeExpr,
    },
}

impl TypeDecl {
    pub fn constant(name: impl Into<String>) -> Self {
        Self::root(name, DeclKind::Constant { derived: false })
    }

    pub fn derived_constant(name: impl Into<String>) -> Self {
        Self::root(name, DeclKind::Constant { derived: true })
    }

    pub fn constructor(name: impl Into<String>, args: Vec<TypeExpr>) -> Self {
        Self::root(
            name,
            DeclKind::Constructor {
                derived: false,
                args,
            },
        )
    }

    pub fn derived_constructor(name: impl Into<String>, args: Vec<TypeExpr>) -> Self {
        Self::root(
            name,
            DeclKind::Constructor {
                derived: true,
                args,
            },
        )
    }

    pub fn map(name: impl Into<String>, domain: Vec<TypeExpr>, codomain: Vec<TypeExpr>) -> Self {
        Self::root(name, DeclKind::Map { domain, codomain })
    }

    pub fn union(name: impl Into<String>, def: TypeExpr) -> Self {
        Self::root(name, DeclKind::Union { def })
    }

    pub fn in_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    pub fn qualified_name(&self) -> String {
        if self.namespace.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.namespace, self.name)
        }
    }

    fn root(name: impl Into<String>, kind: DeclKind) -> Self {
        Self {
            name: name.into(),
            namespace: String::new(),
            kind,
            span: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TypeExpr {
    Id {
        name: String,
        #[serde(default)]
        span: Option<Span>,
    },
    Enum {
        elems: Vec<EnumElem>,
        #[serde(default)]
        span: Option<Span>,
    },
    Union {
        items: Vec<TypeExpr>,
        #[serde(default)]
        span: Option<Span>,
    },
}

impl TypeExpr {
    pub fn id(name: impl Into<String>) -> Self {
        TypeExpr::Id {
            name: name.into(),
            span: None,
        }
    }

    pub fn enumeration(elems: Vec<EnumElem>) -> Self {
        TypeExpr::Enum { elems, span: None }
    }

    pub fn union(items: Vec<TypeExpr>) -> Self {
        TypeExpr::Union { items, span: None }
    }

    pub fn span(&self) -> Option<&Span> {
        match self {
            TypeExpr::Id { span, .. } | TypeExpr::Enum { span, .. } | TypeExpr::Union { span, .. } => {
                span.as_ref()
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EnumElem {
    /// Integer, `p/q` rational or decimal numeral.
    Num {
        value: String,
        #[serde(default)]
        span: Option<Span>,
    },
    Str {
        value: String,
        #[serde(default)]
        span: Option<Span>,
    },
    Id {
        name: String,
        #[serde(default)]
        span: Option<Span>,
    },
    Range {
        lo: String,
        hi: String,
        #[serde(default)]
        span: Option<Span>,
    },
}

impl EnumElem {
    pub fn int(value: i64) -> Self {
        EnumElem::Num {
            value: value.to_string(),
            span: None,
        }
    }

    pub fn num(value: impl Into<String>) -> Self {
        EnumElem::Num {
            value: value.into(),
            span: None,
        }
    }

    pub fn string(value: impl Into<String>) -> Self {
        EnumElem::Str {
            value: value.into(),
            span: None,
        }
    }

    pub fn id(name: impl Into<String>) -> Self {
        EnumElem::Id {
            name: name.into(),
            span: None,
        }
    }

    pub fn range(lo: i64, hi: i64) -> Self {
        EnumElem::Range {
            lo: lo.to_string(),
            hi: hi.to_string(),
            span: None,
        }
    }

    pub fn span(&self) -> Option<&Span> {
        match self {
            EnumElem::Num { span, .. }
            | EnumElem::Str { span, .. }
            | EnumElem::Id { span, .. }
            | EnumElem::Range { span, .. } => span.as_ref(),
        }
    }
}
