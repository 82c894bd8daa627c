//! Client command line

use clap::{ArgGroup, Parser};
use std::time::Duration;

use crate::client::request::Request;
use crate::error::ClientError;
use crate::utils::validation::parse_port;

/// Lists or fetches files from an ftserver
#[derive(Parser, Debug)]
#[command(name = "ftclient", version, about, long_about = None)]
#[command(group(ArgGroup::new("request").required(true).args(["list", "get"])))]
pub struct ClientArgs {
    /// Server host name or address
    pub host: String,

    /// Server control port
    pub server_port: String,

    /// List the served directory, received on DATA_PORT
    #[arg(short = 'l', long = "list", value_name = "DATA_PORT")]
    pub list: Option<String>,

    /// Fetch FILENAME, received on DATA_PORT
    #[arg(
        short = 'g',
        long = "get",
        num_args = 2,
        value_names = ["FILENAME", "DATA_PORT"]
    )]
    pub get: Option<Vec<String>>,

    /// Seconds to wait for the server at each step
    #[arg(long, default_value_t = 30)]
    pub timeout_secs: u64,
}

impl ClientArgs {
    pub fn server_port(&self) -> Result<u16, ClientError> {
        parse_port(&self.server_port)
            .ok_or_else(|| ClientError::InvalidPort(self.server_port.clone()))
    }

    /// The request named on the command line, with its data port checked.
    pub fn request(&self) -> Result<Request, ClientError> {
        let data_port = |text: &String| {
            parse_port(text).ok_or_else(|| ClientError::InvalidPort(text.clone()))
        };

        match (&self.list, self.get.as_deref()) {
            (Some(port), _) => Ok(Request::List {
                data_port: data_port(port)?,
            }),
            (None, Some([filename, port])) => Ok(Request::Get {
                filename: filename.clone(),
                data_port: data_port(port)?,
            }),
            _ => Err(ClientError::NoRequest),
        }
    }

    pub fn wait(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_request() {
        let args =
            ClientArgs::try_parse_from(["ftclient", "flip1", "30021", "-l", "30022"]).unwrap();
        assert_eq!(args.host, "flip1");
        assert_eq!(args.server_port().unwrap(), 30021);
        assert_eq!(args.request().unwrap(), Request::List { data_port: 30022 });
    }

    #[test]
    fn test_get_request() {
        let args = ClientArgs::try_parse_from([
            "ftclient",
            "localhost",
            "30021",
            "-g",
            "notes.txt",
            "30022",
        ])
        .unwrap();
        assert_eq!(
            args.request().unwrap(),
            Request::Get {
                filename: "notes.txt".into(),
                data_port: 30022
            }
        );
    }

    #[test]
    fn test_exactly_one_request_required() {
        assert!(ClientArgs::try_parse_from(["ftclient", "localhost", "30021"]).is_err());
        assert!(
            ClientArgs::try_parse_from([
                "ftclient", "localhost", "30021", "-l", "30022", "-g", "a", "30023"
            ])
            .is_err()
        );
        assert!(ClientArgs::try_parse_from(["ftclient", "localhost", "30021", "-g", "a"]).is_err());
    }

    #[test]
    fn test_ports_out_of_range() {
        let args =
            ClientArgs::try_parse_from(["ftclient", "localhost", "80", "-l", "1000"]).unwrap();
        assert!(matches!(args.server_port(), Err(ClientError::InvalidPort(p)) if p == "80"));
        assert!(matches!(args.request(), Err(ClientError::InvalidPort(p)) if p == "1000"));
    }
}
