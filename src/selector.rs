// Copyright (c) Chris Gunn.
// Licensed under the MIT license.

// Compact text form for naming a section, as used in action scripts:
//
//   stages/stage=deploy                  scope `stages`, identifier match
//   steps/task[displayName="Deploy"]     type and property match
//   steps/[displayName=Deploy]           property match
//   stage=deploy/job=release             scope limited to the `deploy` stage
//   variables                            scope only


use chumsky::{prelude::*, text::TextParser};
use thiserror::Error;

use crate::action::{is_bare_char, Matcher, SectionScope};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Selector {
    pub scope: SectionScope,
    pub matcher: Option<Matcher>,
}

#[derive(Debug, Error)]
#[error("invalid selector `{input}`: {message}")]
pub struct SelectorError {
    pub input: String,
    pub message: String,
}

pub struct SelectorParser {
    parser: Box<dyn Parser<char, Selector, Error = Simple<char>>>,
}

impl SelectorParser {
    pub fn new() -> SelectorParser {
        let parser = gen_selector_parser();
        SelectorParser {
            parser: Box::new(parser),
        }
    }

    pub fn parse(&self, input: &str) -> Result<Selector, SelectorError> {
        self.parser.parse(input).map_err(|errs| {
            let message = errs.iter().map(|err| err.to_string()).collect::<Vec<_>>().join("; ");
            SelectorError {
                input: input.to_string(),
                message,
            }
        })
    }
}

impl Default for SelectorParser {
    fn default() -> Self {
        SelectorParser::new()
    }
}

fn gen_selector_parser() -> impl Parser<char, Selector, Error = Simple<char>> {
    let escape = just('\\').ignore_then(
        just('\\')
            .or(just('"'))
            .or(just('n').to('\n'))
            .or(just('t').to('\t')),
    );

    let string = just('"')
        .ignore_then(filter(|c: &char| *c != '\\' && *c != '"').or(escape).repeated())
        .then_ignore(just('"'))
        .collect::<String>()
        .labelled("string");

    let word = filter(|c: &char| is_bare_char(*c))
        .repeated()
        .at_least(1)
        .collect::<String>()
        .labelled("word");

    let value = string.or(word).labelled("value");

    let pair = value.clone().then_ignore(just('=')).then(value.clone());

    let property = pair.clone().delimited_by(just('['), just(']'));

    let property_only = property
        .clone()
        .map(|(property, value)| Matcher::Property { property, value });

    let type_and_property = value
        .clone()
        .then(property)
        .map(|(section_type, (property, value))| Matcher::TypeAndProperty {
            section_type,
            property,
            value,
        });

    let identifier = pair.clone().map(|(section_type, identifier)| Matcher::Identifier {
        section_type,
        identifier,
    });

    let matcher = property_only.or(type_and_property).or(identifier).labelled("matcher");

    let scope = value
        .clone()
        .then(just('=').ignore_then(value).or_not())
        .map(|(label, value)| SectionScope { label, value })
        .labelled("scope");

    scope
        .then(just('/').ignore_then(matcher).or_not())
        .padded()
        .then_ignore(end())
        .map(|(scope, matcher)| Selector { scope, matcher })
}
