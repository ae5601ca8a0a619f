//! Node kinds of the SLQ AST.

use std::fmt;

use serde::Serialize;

use super::NodeId;

/// Join flavours understood by the `*join` keywords.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JoinType {
    Inner,
    Left,
    LeftOuter,
    Right,
    RightOuter,
    FullOuter,
    Cross,
}

impl JoinType {
    pub const ALL: [JoinType; 7] = [
        JoinType::Inner,
        JoinType::Left,
        JoinType::LeftOuter,
        JoinType::Right,
        JoinType::RightOuter,
        JoinType::FullOuter,
        JoinType::Cross,
    ];

    pub fn from_keyword(kw: &str) -> Option<Self> {
        let jt = match kw {
            "join" | "inner_join" => JoinType::Inner,
            "left_join" | "ljoin" => JoinType::Left,
            "left_outer_join" | "lojoin" => JoinType::LeftOuter,
            "right_join" | "rjoin" => JoinType::Right,
            "right_outer_join" | "rojoin" => JoinType::RightOuter,
            "full_outer_join" | "fojoin" => JoinType::FullOuter,
            "cross_join" | "xjoin" => JoinType::Cross,
            _ => return None,
        };
        Some(jt)
    }

    pub fn is_cross(&self) -> bool {
        *self == JoinType::Cross
    }

    pub fn sql_keyword(&self) -> &'static str {
        match self {
            JoinType::Inner => "INNER JOIN",
            JoinType::Left => "LEFT JOIN",
            JoinType::LeftOuter => "LEFT OUTER JOIN",
            JoinType::Right => "RIGHT JOIN",
            JoinType::RightOuter => "RIGHT OUTER JOIN",
            JoinType::FullOuter => "FULL OUTER JOIN",
            JoinType::Cross => "CROSS JOIN",
        }
    }
}

impl fmt::Display for JoinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.sql_keyword())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    #[default]
    None,
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LiteralKind {
    Null,
    Int,
    Float,
    String,
    Bool,
}

/// Payload of an AST node.
///
/// `Selector` is the generic, not yet narrowed selector. The narrowing passes
/// replace every one of them with `TableSelector`, `ColSelector` or
/// `TblColSelector`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NodeKind {
    Query,
    Segment,
    Handle {
        name: String,
    },
    Selector {
        name0: String,
        name1: Option<String>,
        alias: Option<String>,
    },
    TableSelector {
        handle: Option<String>,
        table: String,
        alias: Option<String>,
    },
    ColSelector {
        column: String,
        alias: Option<String>,
    },
    TblColSelector {
        table: String,
        column: String,
        alias: Option<String>,
    },
    Func {
        name: String,
        alias: Option<String>,
        proprietary: bool,
    },
    Join {
        join_type: JoinType,
        left: Option<NodeId>,
        right: Option<NodeId>,
    },
    Expr {
        parenthesized: bool,
        alias: Option<String>,
    },
    Where,
    GroupBy,
    Having,
    OrderBy,
    OrderByTerm {
        direction: Direction,
    },
    /// `limit` is -1 when the range is open ended.
    RowRange {
        offset: i64,
        limit: i64,
    },
    Unique,
    Arg {
        name: String,
    },
    Literal {
        kind: LiteralKind,
        text: String,
    },
    Operator {
        text: String,
    },
}

impl NodeKind {
    pub fn kind(&self) -> Kind {
        match self {
            NodeKind::Query => Kind::Query,
            NodeKind::Segment => Kind::Segment,
            NodeKind::Handle { .. } => Kind::Handle,
            NodeKind::Selector { .. } => Kind::Selector,
            NodeKind::TableSelector { .. } => Kind::TableSelector,
            NodeKind::ColSelector { .. } => Kind::ColSelector,
            NodeKind::TblColSelector { .. } => Kind::TblColSelector,
            NodeKind::Func { .. } => Kind::Func,
            NodeKind::Join { .. } => Kind::Join,
            NodeKind::Expr { .. } => Kind::Expr,
            NodeKind::Where => Kind::Where,
            NodeKind::GroupBy => Kind::GroupBy,
            NodeKind::Having => Kind::Having,
            NodeKind::OrderBy => Kind::OrderBy,
            NodeKind::OrderByTerm { .. } => Kind::OrderByTerm,
            NodeKind::RowRange { .. } => Kind::RowRange,
            NodeKind::Unique => Kind::Unique,
            NodeKind::Arg { .. } => Kind::Arg,
            NodeKind::Literal { .. } => Kind::Literal,
            NodeKind::Operator { .. } => Kind::Operator,
        }
    }

    pub fn alias(&self) -> Option<&str> {
        match self {
            NodeKind::Selector { alias, .. }
            | NodeKind::TableSelector { alias, .. }
            | NodeKind::ColSelector { alias, .. }
            | NodeKind::TblColSelector { alias, .. }
            | NodeKind::Func { alias, .. }
            | NodeKind::Expr { alias, .. } => alias.as_deref(),
            _ => None,
        }
    }

    pub fn is(&self, kind: Kind) -> bool {
        kind.matches(self)
    }
}

/// Node kind tag used to match visitors and inspector queries.
///
/// The last four variants are abstract: they match a group of concrete kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Query,
    Segment,
    Handle,
    Selector,
    TableSelector,
    ColSelector,
    TblColSelector,
    Func,
    Join,
    Expr,
    Where,
    GroupBy,
    Having,
    OrderBy,
    OrderByTerm,
    RowRange,
    Unique,
    Arg,
    Literal,
    Operator,

    Any,
    AnySelector,
    /// Produces rows: a table selector or a join.
    Tabler,
    /// Can appear in the SELECT column list.
    ResultColumn,
}

impl Kind {
    pub fn matches(self, node: &NodeKind) -> bool {
        let concrete = node.kind();
        match self {
            Kind::Any => true,
            Kind::AnySelector => matches!(
                concrete,
                Kind::Selector | Kind::TableSelector | Kind::ColSelector | Kind::TblColSelector
            ),
            Kind::Tabler => matches!(concrete, Kind::TableSelector | Kind::Join),
            Kind::ResultColumn => matches!(
                concrete,
                Kind::ColSelector
                    | Kind::TblColSelector
                    | Kind::Func
                    | Kind::Expr
                    | Kind::Literal
                    | Kind::Arg
            ),
            exact => exact == concrete,
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}
