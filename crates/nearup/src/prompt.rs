//! Resolution of launch parameters, optionally asking the user.

use std::fmt::Display;
use std::str::FromStr;

use dialoguer::{Confirm, Input};

/// Something that can ask the user a question.
pub trait Prompter {
    /// Ask a yes/no question.
    fn confirm(&self, question: &str, default: bool) -> std::io::Result<bool>;
    /// Ask for a free-form answer, offering `default`.
    fn input(&self, question: &str, default: &str) -> std::io::Result<String>;
}

/// Prompts on the controlling terminal.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalPrompter;

impl Prompter for TerminalPrompter {
    fn confirm(&self, question: &str, default: bool) -> std::io::Result<bool> {
        Confirm::new()
            .with_prompt(question)
            .default(default)
            .interact()
            .map_err(std::io::Error::other)
    }

    fn input(&self, question: &str, default: &str) -> std::io::Result<String> {
        Input::new()
            .with_prompt(question)
            .default(default.to_string())
            .allow_empty(true)
            .interact_text()
            .map_err(std::io::Error::other)
    }
}

/// Turns supplied values, defaults and (when interactive) user answers into
/// concrete parameters.
pub struct ParameterResolver<'a> {
    prompter: Option<&'a dyn Prompter>,
}

impl<'a> ParameterResolver<'a> {
    /// A resolver that never asks; missing values take their defaults.
    pub fn non_interactive() -> Self {
        Self { prompter: None }
    }

    /// A resolver that asks `prompter` for every value not supplied.
    pub fn interactive(prompter: &'a dyn Prompter) -> Self {
        Self {
            prompter: Some(prompter),
        }
    }

    pub fn is_interactive(&self) -> bool {
        self.prompter.is_some()
    }

    /// Resolve a value: the supplied one if any, else the user's answer, else `default`.
    ///
    /// Answers that fail to parse are asked again.
    pub fn value<T>(&self, question: &str, supplied: Option<T>, default: T) -> std::io::Result<T>
    where
        T: FromStr + Display,
        T::Err: Display,
    {
        if let Some(value) = supplied {
            return Ok(value);
        }
        let Some(prompter) = self.prompter else {
            return Ok(default);
        };
        let default = default.to_string();
        loop {
            let answer = prompter.input(question, &default)?;
            let answer = if answer.trim().is_empty() {
                default.as_str()
            } else {
                answer.trim()
            };
            match answer.parse() {
                Ok(value) => return Ok(value),
                Err(e) => tracing::warn!("invalid answer {answer:?}: {e}"),
            }
        }
    }

    /// Resolve a flag: set flags stay set; otherwise ask, defaulting to no.
    pub fn flag(&self, question: &str, supplied: bool) -> std::io::Result<bool> {
        if supplied {
            return Ok(true);
        }
        match self.prompter {
            Some(prompter) => prompter.confirm(question, false),
            None => Ok(false),
        }
    }
}
