use winnow::ascii::{space0, space1};
use winnow::combinator::{delimited, terminated};
use winnow::error::ModalResult;
use winnow::prelude::*;

use super::lexer::identifier;
use crate::{EligoError, Rule};

/// `rule <name>:` at the start of a line.
fn header<'i>(input: &mut &'i str) -> ModalResult<&'i str> {
    delimited(("rule", space1), identifier, terminated(space0, ':')).parse_next(input)
}

struct Draft<'i> {
    name: &'i str,
    body: Vec<&'i str>,
}

/// Parse a rule book: several named rules in one document.
///
/// ```text
/// # Comments take a whole line.
/// rule senior_sales:
///     age > 30 AND department == 'Sales'
/// rule well_paid: salary >= 50000
/// ```
///
/// A rule's body is the rest of its header line plus every following line up
/// to the next header. Body lines are trimmed and joined with single spaces to
/// form the rule's source text.
///
/// # Errors
///
/// Returns [`EligoError::RuleBook`] for text before the first header,
/// [`EligoError::InRule`] when a body does not parse, and
/// [`EligoError::EmptyRuleSet`] when the document defines no rules.
pub fn parse_rule_book(input: &str) -> Result<Vec<Rule>, EligoError> {
    let mut drafts: Vec<Draft<'_>> = Vec::new();

    for (index, line) in input.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let mut rest = trimmed;
        if let Ok(name) = header(&mut rest) {
            drafts.push(Draft {
                name,
                body: vec![rest],
            });
        } else if let Some(draft) = drafts.last_mut() {
            draft.body.push(trimmed);
        } else {
            return Err(EligoError::RuleBook {
                line: index + 1,
                message: "expected a rule header ('rule <name>:')".to_owned(),
            });
        }
    }

    if drafts.is_empty() {
        return Err(EligoError::EmptyRuleSet);
    }

    drafts
        .into_iter()
        .map(|draft| {
            let source = draft
                .body
                .iter()
                .map(|line| line.trim())
                .filter(|line| !line.is_empty())
                .collect::<Vec<_>>()
                .join(" ");
            Rule::new(draft.name, source).map_err(|err| match err {
                EligoError::Parse(source) => EligoError::InRule {
                    rule: draft.name.to_owned(),
                    source,
                },
                other => other,
            })
        })
        .collect()
}
