// File: ./src/lists.rs
//! Decides, once per list name and run, whether tasks go into that list.
use crate::error::StoreError;
use crate::model::CalendarListEntry;
use crate::store::CalendarStore;
use std::collections::HashMap;
use std::io::{BufRead, Write};
use strum::{Display, EnumString};

/// How existing and missing destination lists are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString)]
#[strum(serialize_all = "kebab-case")]
pub enum ListPolicy {
    /// Ask the operator for every list name.
    #[default]
    Prompt,
    /// Only fill lists this run creates; skip lists that already exist.
    AvoidExisting,
    /// Use existing lists, create missing ones.
    NewAndExisting,
}

/// Final outcome for a list name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "UPPERCASE")]
pub enum ListAction {
    Add,
    Skip,
}

/// Operator answer under [`ListPolicy::Prompt`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListAnswer {
    Add,
    Skip,
    Create,
}

/// Source of answers for [`ListPolicy::Prompt`].
pub trait ListDecider {
    fn decide(&mut self, list_name: &str, exists: bool) -> ListAnswer;
}

impl<F> ListDecider for F
where
    F: FnMut(&str, bool) -> ListAnswer,
{
    fn decide(&mut self, list_name: &str, exists: bool) -> ListAnswer {
        self(list_name, exists)
    }
}

/// Asks on a terminal (or any reader/writer pair).
pub struct PromptDecider<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> PromptDecider<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    fn ask(&mut self, question: &str) -> std::io::Result<()> {
        write!(self.output, "{}", question)?;
        self.output.flush()
    }
}

impl PromptDecider<std::io::StdinLock<'static>, std::io::Stdout> {
    pub fn stdio() -> Self {
        Self::new(std::io::stdin().lock(), std::io::stdout())
    }
}

impl<R: BufRead, W: Write> ListDecider for PromptDecider<R, W> {
    fn decide(&mut self, list_name: &str, exists: bool) -> ListAnswer {
        let question = if exists {
            format!("List '{}' already exists. [a]dd tasks to it or [s]kip? ", list_name)
        } else {
            format!("List '{}' does not exist. [c]reate it or [s]kip? ", list_name)
        };

        loop {
            if let Err(e) = self.ask(&question) {
                log::warn!("Cannot prompt for list '{}' ({}), skipping it", list_name, e);
                return ListAnswer::Skip;
            }

            let mut line = String::new();
            match self.input.read_line(&mut line) {
                Ok(0) | Err(_) => {
                    log::warn!("No answer for list '{}', skipping it", list_name);
                    return ListAnswer::Skip;
                }
                Ok(_) => {}
            }

            match (line.trim().to_lowercase().as_str(), exists) {
                ("a" | "add", true) => return ListAnswer::Add,
                ("c" | "create", false) => return ListAnswer::Create,
                ("s" | "skip", _) => return ListAnswer::Skip,
                _ => {
                    if let Err(e) =
                        writeln!(self.output, "Please answer with one of the bracketed letters.")
                    {
                        log::warn!("Cannot prompt for list '{}' ({}), skipping it", list_name, e);
                        return ListAnswer::Skip;
                    }
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Absent when the list does not exist and was not created.
    pub list: Option<CalendarListEntry>,
    pub action: ListAction,
}

impl Resolution {
    fn add(list: CalendarListEntry) -> Self {
        Self {
            list: Some(list),
            action: ListAction::Add,
        }
    }

    fn skip(list: Option<CalendarListEntry>) -> Self {
        Self {
            list,
            action: ListAction::Skip,
        }
    }

    /// The list to write into, if tasks are to be added.
    pub fn target(&self) -> Option<&CalendarListEntry> {
        match self.action {
            ListAction::Add => self.list.as_ref(),
            ListAction::Skip => None,
        }
    }
}

/// Run-scoped memo of list decisions.
#[derive(Debug, Default)]
pub struct ListResolver {
    memo: HashMap<String, Resolution>,
}

impl ListResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct list names decided so far.
    pub fn decided(&self) -> usize {
        self.memo.len()
    }

    pub fn cached(&self, name: &str) -> Option<&Resolution> {
        self.memo.get(name)
    }

    pub async fn resolve<S, D>(
        &mut self,
        name: &str,
        policy: ListPolicy,
        store: &S,
        decider: &mut D,
    ) -> Result<Resolution, StoreError>
    where
        S: CalendarStore,
        D: ListDecider + ?Sized,
    {
        if let Some(done) = self.memo.get(name) {
            return Ok(done.clone());
        }

        let existing = store.find_list(name).await?;
        let resolution = match (policy, existing) {
            (ListPolicy::Prompt, Some(list)) => match decider.decide(name, true) {
                ListAnswer::Skip => Resolution::skip(Some(list)),
                ListAnswer::Add | ListAnswer::Create => Resolution::add(list),
            },
            (ListPolicy::Prompt, None) => match decider.decide(name, false) {
                ListAnswer::Skip => Resolution::skip(None),
                ListAnswer::Add | ListAnswer::Create => {
                    Resolution::add(store.create_list(name).await?)
                }
            },
            (ListPolicy::AvoidExisting, Some(list)) => Resolution::skip(Some(list)),
            (ListPolicy::AvoidExisting | ListPolicy::NewAndExisting, None) => {
                Resolution::add(store.create_list(name).await?)
            }
            (ListPolicy::NewAndExisting, Some(list)) => Resolution::add(list),
        };

        log::info!("List '{}': {}", name, resolution.action);
        self.memo.insert(name.to_string(), resolution.clone());
        Ok(resolution)
    }
}
