#![allow(clippy::module_name_repetitions)]
use std::{
    collections::{BTreeSet, HashMap},
    fmt::Display,
    iter::Peekable,
    ops::{BitAnd, BitOr},
    str::FromStr,
};

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::{FormatErr, ParsingError};

/// A leaf occurrence of an access policy.
///
/// The same attribute may appear several times in a policy: each occurrence
/// receives its own share, so leaves are identified by the attribute name and
/// the number of times this attribute appeared before, left to right.
#[derive(Hash, PartialEq, Eq, Clone, PartialOrd, Ord, Debug, Serialize, Deserialize)]
pub struct LeafId {
    attribute: String,
    occurrence: u32,
}

impl LeafId {
    #[must_use]
    pub fn new(attribute: &str, occurrence: u32) -> Self {
        Self {
            attribute: attribute.to_owned(),
            occurrence,
        }
    }

    /// The attribute name, stripped of its occurrence index
    #[must_use]
    pub fn attribute(&self) -> &str {
        &self.attribute
    }

    #[must_use]
    pub fn occurrence(&self) -> u32 {
        self.occurrence
    }
}

impl Display for LeafId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}#{}", self.attribute, self.occurrence)
    }
}

// An `AccessPolicy` is a monotone boolean expression over attributes.
// Only `positive` literals are allowed (no negation).
// A gate is satisfied when at least `threshold` of its children are:
// AND is `n` of `n`, OR is `1` of `n`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub enum AccessPolicy {
    Attr(String),
    Gate {
        threshold: usize,
        children: Vec<AccessPolicy>,
    },
}

/// Create an Access Policy from a single attribute name.
///
/// Access Policies can easily be created using it
/// ```ignore
/// let access_policy = ap("DOCTOR") & (ap("CARDIOLOGY") | ap("EMERGENCY"));
/// ```
pub fn ap(attribute: &str) -> AccessPolicy {
    AccessPolicy::Attr(attribute.to_owned())
}

/// A policy tree whose leaves carry their `LeafId`
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum LabelledNode {
    Leaf(LeafId),
    Gate {
        threshold: usize,
        children: Vec<LabelledNode>,
    },
}

impl LabelledNode {
    pub(crate) fn leaves(&self) -> Vec<&LeafId> {
        match self {
            LabelledNode::Leaf(id) => vec![id],
            LabelledNode::Gate { children, .. } => {
                children.iter().flat_map(LabelledNode::leaves).collect()
            }
        }
    }
}

impl AccessPolicy {
    /// AND of all the given policies
    #[must_use]
    pub fn and(children: Vec<AccessPolicy>) -> Self {
        Self::Gate {
            threshold: children.len(),
            children,
        }
    }

    /// OR of all the given policies
    #[must_use]
    pub fn or(children: Vec<AccessPolicy>) -> Self {
        Self::Gate {
            threshold: 1,
            children,
        }
    }

    /// `threshold`-of-`n` gate. A threshold greater than the number of
    /// children is accepted: such a gate can never be satisfied.
    pub fn threshold(threshold: usize, children: Vec<AccessPolicy>) -> Result<Self, FormatErr> {
        if threshold == 0 {
            return Err(
                ParsingError::InvalidThreshold("threshold must be at least 1".to_string()).into(),
            );
        }
        if children.is_empty() {
            return Err(ParsingError::InvalidThreshold(
                "a gate needs at least one child".to_string(),
            )
            .into());
        }
        Ok(Self::Gate {
            threshold,
            children,
        })
    }

    fn is_and(&self) -> bool {
        matches!(
            self,
            AccessPolicy::Gate { threshold, children }
                if children.len() > 1 && *threshold == children.len()
        )
    }

    fn is_or(&self) -> bool {
        matches!(
            self,
            AccessPolicy::Gate { threshold, children } if children.len() > 1 && *threshold == 1
        )
    }

    fn into_children(self) -> Vec<AccessPolicy> {
        match self {
            AccessPolicy::Gate { children, .. } => children,
            attr @ AccessPolicy::Attr(_) => vec![attr],
        }
    }

    /// Parse a boolean expression into an `AccessPolicy`.
    ///
    /// Attribute names are case sensitive and cannot contain spaces,
    /// parenthesis or commas. The operators `and` and `or` are case
    /// insensitive, `and` binding tighter than `or`. A `k`-of-`n` gate is
    /// written `k of (A, B, C)`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use cosmian_proxy_abe::core::policy::{ap, AccessPolicy};
    ///
    /// let policy = AccessPolicy::parse("((ONE or THREE) and (TWO or FOUR))").unwrap();
    /// assert_eq!(policy, (ap("ONE") | ap("THREE")) & (ap("TWO") | ap("FOUR")));
    /// assert_eq!(AccessPolicy::parse("A and B").unwrap(), ap("A") & ap("B"));
    /// ```
    ///
    /// # Errors
    ///
    /// Empty expression, unbalanced parenthesis, missing operand or operator,
    /// or a threshold of zero.
    pub fn parse(boolean_expression: &str) -> Result<Self, FormatErr> {
        let tokens = tokenize(boolean_expression)?;
        if tokens.is_empty() {
            return Err(ParsingError::EmptyString.into());
        }
        let mut depth = 0_i32;
        for token in &tokens {
            match *token {
                "(" => depth += 1,
                ")" => depth -= 1,
                _ => {}
            }
            if depth < 0 {
                break;
            }
        }
        if depth != 0 {
            return Err(ParsingError::UnbalancedParenthesis(boolean_expression.to_string()).into());
        }

        let mut tokens = tokens.into_iter().peekable();
        let policy = parse_or(&mut tokens)?;
        if let Some(token) = tokens.next() {
            return Err(ParsingError::UnexpectedToken(format!(
                "unexpected '{token}' in {boolean_expression}"
            ))
            .into());
        }
        trace!("parsed access policy: {policy}");
        Ok(policy)
    }

    /// Attribute names appearing in the policy
    #[must_use]
    pub fn attributes(&self) -> BTreeSet<String> {
        self.leaves()
            .into_iter()
            .map(|leaf| leaf.attribute)
            .collect()
    }

    /// Leaf occurrences of the policy, from left to right
    #[must_use]
    pub fn leaves(&self) -> Vec<LeafId> {
        self.labelled()
            .leaves()
            .into_iter()
            .cloned()
            .collect()
    }

    /// Check whether the given attributes satisfy this policy
    #[must_use]
    pub fn is_satisfied_by(&self, attributes: &BTreeSet<String>) -> bool {
        match self {
            AccessPolicy::Attr(attribute) => attributes.contains(attribute),
            AccessPolicy::Gate {
                threshold,
                children,
            } => {
                children
                    .iter()
                    .filter(|child| child.is_satisfied_by(attributes))
                    .count()
                    >= *threshold
            }
        }
    }

    // Attach to each leaf its occurrence index
    pub(crate) fn labelled(&self) -> LabelledNode {
        fn label(node: &AccessPolicy, counters: &mut HashMap<String, u32>) -> LabelledNode {
            match node {
                AccessPolicy::Attr(attribute) => {
                    let counter = counters.entry(attribute.clone()).or_insert(0);
                    let id = LeafId::new(attribute, *counter);
                    *counter += 1;
                    LabelledNode::Leaf(id)
                }
                AccessPolicy::Gate {
                    threshold,
                    children,
                } => LabelledNode::Gate {
                    threshold: *threshold,
                    children: children.iter().map(|c| label(c, counters)).collect(),
                },
            }
        }
        label(self, &mut HashMap::new())
    }
}

impl FromStr for AccessPolicy {
    type Err = FormatErr;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

// Split the expression in parenthesis, commas and words
fn tokenize(boolean_expression: &str) -> Result<Vec<&str>, FormatErr> {
    let token_reg = Regex::new(r"[(),]|[^\s(),]+")?;
    Ok(token_reg
        .find_iter(boolean_expression)
        .map(|m| m.as_str())
        .collect())
}

type Tokens<'a> = Peekable<std::vec::IntoIter<&'a str>>;

fn is_keyword(token: &str, keyword: &str) -> bool {
    token.eq_ignore_ascii_case(keyword)
}

fn is_reserved(token: &str) -> bool {
    ["(", ")", ","].contains(&token) || ["and", "or", "of"].iter().any(|k| is_keyword(token, k))
}

// or_expr := and_expr ( 'or' and_expr )*
fn parse_or(tokens: &mut Tokens) -> Result<AccessPolicy, FormatErr> {
    let mut policy = parse_and(tokens)?;
    while tokens.peek().map_or(false, |t| is_keyword(t, "or")) {
        tokens.next();
        policy = policy | parse_and(tokens)?;
    }
    Ok(policy)
}

// and_expr := operand ( 'and' operand )*
fn parse_and(tokens: &mut Tokens) -> Result<AccessPolicy, FormatErr> {
    let mut policy = parse_operand(tokens)?;
    while tokens.peek().map_or(false, |t| is_keyword(t, "and")) {
        tokens.next();
        policy = policy & parse_operand(tokens)?;
    }
    Ok(policy)
}

// operand := '(' or_expr ')' | k 'of' '(' or_expr ( ',' or_expr )* ')' | attribute
fn parse_operand(tokens: &mut Tokens) -> Result<AccessPolicy, FormatErr> {
    let token = tokens.next().ok_or_else(|| {
        ParsingError::UnexpectedEnd("an attribute or '(' is expected".to_string())
    })?;
    if token == "(" {
        let policy = parse_or(tokens)?;
        expect(tokens, ")")?;
        return Ok(policy);
    }
    if tokens.peek().map_or(false, |t| is_keyword(t, "of"))
        && token.chars().all(|c| c.is_ascii_digit())
    {
        tokens.next();
        let threshold = token.parse::<usize>()?;
        expect(tokens, "(")?;
        let mut children = vec![parse_or(tokens)?];
        while tokens.peek() == Some(&",") {
            tokens.next();
            children.push(parse_or(tokens)?);
        }
        expect(tokens, ")")?;
        return AccessPolicy::threshold(threshold, children);
    }
    if is_reserved(token) {
        return Err(ParsingError::UnexpectedToken(format!(
            "an attribute or '(' is expected, found '{token}'"
        ))
        .into());
    }
    Ok(ap(token))
}

fn expect(tokens: &mut Tokens, expected: &str) -> Result<(), FormatErr> {
    match tokens.next() {
        Some(token) if token == expected => Ok(()),
        Some(token) => Err(ParsingError::UnexpectedToken(format!(
            "'{expected}' expected, found '{token}'"
        ))
        .into()),
        None => Err(ParsingError::UnexpectedEnd(format!("'{expected}' expected")).into()),
    }
}

// use A & B to construct And(A, B), flattening nested ANDs
impl BitAnd for AccessPolicy {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self::Output {
        let mut children = if self.is_and() {
            self.into_children()
        } else {
            vec![self]
        };
        if rhs.is_and() {
            children.extend(rhs.into_children());
        } else {
            children.push(rhs);
        }
        Self::and(children)
    }
}

// use A | B to construct Or(A, B), flattening nested ORs
impl BitOr for AccessPolicy {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        let mut children = if self.is_or() {
            self.into_children()
        } else {
            vec![self]
        };
        if rhs.is_or() {
            children.extend(rhs.into_children());
        } else {
            children.push(rhs);
        }
        Self::or(children)
    }
}

// Canonical expression, parsed back to the same policy. The parser merges
// nested gates of the same kind, so such a gate is written in its threshold
// form to keep its structure.
impl Display for AccessPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        fn operand(child: &AccessPolicy) -> String {
            match child {
                AccessPolicy::Attr(name) => name.clone(),
                gate => format!("({gate})"),
            }
        }
        match self {
            AccessPolicy::Attr(name) => write!(f, "{name}"),
            AccessPolicy::Gate { children, .. }
                if self.is_and() && !children.iter().any(AccessPolicy::is_and) =>
            {
                write!(
                    f,
                    "{}",
                    children.iter().map(operand).collect::<Vec<_>>().join(" and ")
                )
            }
            AccessPolicy::Gate { children, .. }
                if self.is_or() && !children.iter().any(AccessPolicy::is_or) =>
            {
                write!(
                    f,
                    "{}",
                    children.iter().map(operand).collect::<Vec<_>>().join(" or ")
                )
            }
            AccessPolicy::Gate {
                threshold,
                children,
            } => write!(
                f,
                "{threshold} of ({})",
                children
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
        }
    }
}
