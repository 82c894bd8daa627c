//! Client requests and how their replies are read

use crate::protocol::{FILE_NOT_FOUND_REPLY, GET_VERB, LIST_VERB};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    List { data_port: u16 },
    Get { filename: String, data_port: u16 },
}

impl Request {
    pub fn data_port(&self) -> u16 {
        match self {
            Request::List { data_port } | Request::Get { data_port, .. } => *data_port,
        }
    }

    /// The command line sent on the control connection
    pub fn command_line(&self) -> String {
        match self {
            Request::List { data_port } => format!("{} {}\n", LIST_VERB, data_port),
            Request::Get {
                filename,
                data_port,
            } => format!("{} {} {}\n", GET_VERB, filename, data_port),
        }
    }
}

/// What the server sent back for one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Everything received on the data connection
    Data(Vec<u8>),
    /// Error text received on the control connection instead
    Rejected(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    Listing(Vec<u8>),
    File(Vec<u8>),
    NotFound,
    Rejected(String),
}

pub fn interpret(request: &Request, reply: Reply) -> Delivery {
    match (request, reply) {
        (_, Reply::Rejected(text)) => Delivery::Rejected(text),
        (Request::List { .. }, Reply::Data(listing)) => Delivery::Listing(listing),
        (Request::Get { .. }, Reply::Data(bytes)) if bytes == FILE_NOT_FOUND_REPLY.as_bytes() => {
            Delivery::NotFound
        }
        (Request::Get { .. }, Reply::Data(bytes)) => Delivery::File(bytes),
    }
}
