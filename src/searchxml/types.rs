//! Query language model - elements, boolean operators and relations.
//!
//! Defines the enumerations the serialized search format encodes, together
//! with their exact lowercase attribute tokens.

/// Structural event returned by the readers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Element {
    /// Root `<search>` element
    Search,
    /// Start of a `<group>`
    Group,
    /// End of a `<group>`
    GroupEnd,
    /// Start of a `<field>`
    Field,
    /// End of a `<field>` whose value was not consumed
    FieldEnd,
    /// End of the document (or an unrecoverable parse error)
    End,
}

/// Boolean combinator joining sibling fields or groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    And,
    Or,
    AndNot,
    OrNot,
}

impl Operator {
    /// Operator of a group without an `operator` attribute.
    pub fn standard_group() -> Self {
        Operator::Or
    }

    /// Operator of a field when neither the field nor its group sets one.
    pub fn standard_field() -> Self {
        Operator::And
    }

    /// Attribute token for this operator.
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::And => "and",
            Operator::Or => "or",
            Operator::AndNot => "andnot",
            Operator::OrNot => "ornot",
        }
    }

    /// Parse an attribute token. Unknown tokens yield `None`.
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "and" => Some(Operator::And),
            "or" => Some(Operator::Or),
            "andnot" => Some(Operator::AndNot),
            "ornot" => Some(Operator::OrNot),
            _ => None,
        }
    }

    /// SQL keyword(s) used to combine a term with its predecessor.
    ///
    /// For the first term of a sequence there is nothing to combine with,
    /// so the operator degrades to its unary form.
    pub fn to_sql(&self, is_first: bool) -> &'static str {
        if is_first {
            return match self {
                Operator::AndNot | Operator::OrNot => "NOT",
                Operator::And | Operator::Or => "",
            };
        }

        match self {
            Operator::And => "AND",
            Operator::Or => "OR",
            Operator::AndNot => "AND NOT",
            Operator::OrNot => "OR NOT",
        }
    }

    /// Constant that leaves an expression unchanged when combined with this operator.
    pub fn no_effect_sql(&self) -> &'static str {
        match self {
            Operator::And | Operator::Or => " 1 ",
            Operator::AndNot | Operator::OrNot => " 0 ",
        }
    }
}

/// Comparison semantics between a field and its value(s).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Relation {
    Equal,
    Unequal,
    Like,
    NotLike,
    LessThan,
    GreaterThan,
    LessThanOrEqual,
    GreaterThanOrEqual,
    /// Closed range [a, b]
    Interval,
    /// Open range (a, b)
    IntervalOpen,
    OneOf,
    AllOf,
    InTree,
    NotInTree,
    /// Geographic radius or enclosing rectangle around a point
    Near,
    /// Geographic rectangle
    Inside,
}

impl Relation {
    /// Relation of a field without a `relation` attribute.
    pub fn standard() -> Self {
        Relation::Equal
    }

    /// Attribute token for this relation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Relation::Equal => "equal",
            Relation::Unequal => "unequal",
            Relation::Like => "like",
            Relation::NotLike => "notlike",
            Relation::LessThan => "lessthan",
            Relation::GreaterThan => "greaterthan",
            Relation::LessThanOrEqual => "lessthanequal",
            Relation::GreaterThanOrEqual => "greaterthanequal",
            Relation::Interval => "interval",
            Relation::IntervalOpen => "intervalopen",
            Relation::OneOf => "oneof",
            Relation::AllOf => "allof",
            Relation::InTree => "intree",
            Relation::NotInTree => "notintree",
            Relation::Near => "near",
            Relation::Inside => "inside",
        }
    }

    /// Parse an attribute token. Unknown tokens yield `None`.
    pub fn parse(token: &str) -> Option<Self> {
        let relation = match token {
            "equal" => Relation::Equal,
            "unequal" => Relation::Unequal,
            "like" => Relation::Like,
            "notlike" => Relation::NotLike,
            "lessthan" => Relation::LessThan,
            "greaterthan" => Relation::GreaterThan,
            "lessthanequal" => Relation::LessThanOrEqual,
            "greaterthanequal" => Relation::GreaterThanOrEqual,
            "interval" => Relation::Interval,
            "intervalopen" => Relation::IntervalOpen,
            "oneof" => Relation::OneOf,
            "allof" => Relation::AllOf,
            "intree" => Relation::InTree,
            "notintree" => Relation::NotInTree,
            "near" => Relation::Near,
            "inside" => Relation::Inside,
            _ => return None,
        };
        Some(relation)
    }

    /// SQL comparison operator. Relations without a direct SQL form map to `=`.
    pub fn to_sql(&self) -> &'static str {
        match self {
            Relation::Unequal => "<>",
            Relation::Like => "LIKE",
            Relation::NotLike => "NOT LIKE",
            Relation::LessThan => "<",
            Relation::GreaterThan => ">",
            Relation::LessThanOrEqual => "<=",
            Relation::GreaterThanOrEqual => ">=",
            Relation::OneOf => "IN",
            _ => "=",
        }
    }

    /// Whether this is one of the two range relations.
    pub fn is_interval(&self) -> bool {
        matches!(self, Relation::Interval | Relation::IntervalOpen)
    }

    /// Whether the bound value of a string comparison gets LIKE wildcards.
    pub fn is_like(&self) -> bool {
        matches!(self, Relation::Like | Relation::NotLike)
    }
}
