use crate::{
    command::{Answer, Command, Control, Medium},
    terms::Terms,
};

/// A command that passed validation and may reach the supervisor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Search(Terms),
    Control(Terms, Control),
}

/// Entry checks applied to every inbound command for one medium.
#[derive(Debug, Clone, Copy)]
pub struct CommandGateway {
    medium: Medium,
}

impl CommandGateway {
    pub fn new(medium: Medium) -> Self {
        Self { medium }
    }

    pub fn medium(&self) -> Medium {
        self.medium
    }

    /// Medium mismatch answers `Fail`; missing terms answer `Error`, control
    /// commands included since their terms carry the routing key.
    pub fn validate(&self, command: Command) -> Result<Request, Answer> {
        if !command.media.contains(&self.medium) {
            return Err(Answer::Fail);
        }

        let Some(terms) = command.terms else {
            return Err(Answer::Error);
        };

        match command.control {
            Some(control) => Ok(Request::Control(terms, control)),
            None => Ok(Request::Search(terms)),
        }
    }
}
