//! Dispatcher: turns inbound chat lines into store calls and reply text.
//!
//! Each line is handled on its own: parse, validate arity, normalize field
//! values, call the store, format the reply. Store failures become reply
//! lines; nothing here panics or aborts the host's read loop.

use std::sync::Arc;

use crate::command::Command;
use crate::errors::{SetupError, StoreError};
use crate::format::{bold, render_site};
use crate::help::{help_text, usage_line};
use crate::parse::parse_line;
use crate::response::Response;
use crate::schema::{FieldValue, SchemaRegistry};
use crate::store::{open_backend, DirectoryStore, Mutation};
use crate::types::config::Settings;

const GENERIC_FAILURE: &str = "Something went wrong, please try again later.";


pub struct Dispatcher {
    store: DirectoryStore,
    prefix: char,
    /// The `database` setting the current backend was opened from.
    database: Option<String>,
}

impl Dispatcher {
    /// Validate the schema, open the configured backend and build a
    /// dispatcher around them.
    pub fn new(settings: &Settings) -> Result<Dispatcher, SetupError> {
        let schema = Arc::new(SchemaRegistry::from_settings(settings)?);
        let backend = open_backend(settings.database.as_deref())?;
        Ok(Dispatcher {
            store: DirectoryStore::new(schema, backend),
            prefix: settings.command_prefix,
            database: settings.database.clone(),
        })
    }

    /// Build around an existing store. Useful for testing.
    pub fn from_store(store: DirectoryStore, prefix: char) -> Dispatcher {
        Dispatcher { store, prefix, database: None }
    }

    /// Apply freshly loaded settings. The backend is reopened only when the
    /// `database` setting changed; on error the dispatcher is left as it was.
    pub fn reconfigure(&mut self, settings: &Settings) -> Result<(), SetupError> {
        let schema = Arc::new(SchemaRegistry::from_settings(settings)?);
        if settings.database != self.database {
            let backend = open_backend(settings.database.as_deref())?;
            self.store = DirectoryStore::new(schema, backend);
            self.database = settings.database.clone();
        } else {
            self.store.set_schema(schema);
        }
        self.prefix = settings.command_prefix;
        tracing::info!(prefix = %self.prefix, "dispatcher reconfigured");
        Ok(())
    }

    pub fn store(&self) -> &DirectoryStore {
        &self.store
    }

    fn schema(&self) -> &SchemaRegistry {
        self.store.schema()
    }

    /// Handle one inbound line.
    pub fn handle_line(&self, line: &str) -> Response {
        match parse_line(line, self.prefix) {
            Ok(Some(cmd)) => self.execute(cmd),
            Ok(None) => Response::Ignored,
            Err(spec) => {
                tracing::debug!(verb = spec.name, "too few arguments");
                let mut lines = vec![usage_line(self.prefix, spec.name)];
                if spec.name == "set" {
                    lines.push(self.valid_fields_line());
                }
                Response::Reply { lines }
            }
        }
    }

    /// Execute a parsed command.
    pub fn execute(&self, cmd: Command) -> Response {
        tracing::debug!(verb = cmd.verb(), "dispatching");
        let result = match cmd {
            Command::AddSite { site } => self.cmd_addsite(&site),
            Command::DelSite { site } => self.cmd_delsite(&site),
            Command::Site { site } => self.cmd_site(&site),
            Command::Sites => self.cmd_sites(),
            Command::Set { site, field, values } => self.cmd_set(&site, &field, &values),
            Command::Add { site, field, values } => self.cmd_add(&site, &field, &values),
            Command::Rm { site, field, values } => self.cmd_rm(&site, &field, &values),
            Command::Search { field, values } => self.cmd_search(&field, &values),
            Command::Help { topic } => Ok(Response::Reply {
                lines: help_text(self.prefix, topic.as_deref()),
            }),
            Command::Reload => {
                tracing::info!("reload requested");
                Ok(Response::Reload)
            }
        };
        result.unwrap_or_else(|e| self.error_reply(e))
    }

    // -----------------------------------------------------------------
    // Site lifecycle
    // -----------------------------------------------------------------

    fn cmd_addsite(&self, site: &str) -> Result<Response, StoreError> {
        let name = self.store.add_site(site)?;
        Ok(Response::line(format!("Added `{}`!", name)))
    }

    fn cmd_delsite(&self, site: &str) -> Result<Response, StoreError> {
        match self.store.delete_site(site)? {
            0 => Ok(self.missing_site(site)),
            _ => Ok(Response::line(format!("Deleted `{}`!", self.schema().normalize_key(site)))),
        }
    }

    fn cmd_site(&self, site: &str) -> Result<Response, StoreError> {
        match self.store.get_site(site)? {
            Some(record) => Ok(Response::Reply { lines: render_site(&record, self.schema()) }),
            None => Ok(self.missing_site(site)),
        }
    }

    fn cmd_sites(&self) -> Result<Response, StoreError> {
        let names = self.store.list_sites()?;
        if names.is_empty() {
            return Ok(Response::line("No sites added yet."));
        }
        Ok(Response::line(format!("{} {}", bold("Sites:"), names.join(" "))))
    }

    // -----------------------------------------------------------------
    // Attribute mutation
    // -----------------------------------------------------------------

    fn cmd_set(&self, site: &str, field: &str, values: &[String]) -> Result<Response, StoreError> {
        let values = self.schema().normalize(field, values);
        match self.store.set_value(site, field, &values)? {
            Mutation::Applied(value) => Ok(Response::line(format!(
                "Set `{}` for `{}` to: {}",
                field,
                self.schema().normalize_key(site),
                value
            ))),
            Mutation::Skipped => Ok(self.missing_site(site)),
        }
    }

    fn cmd_add(&self, site: &str, field: &str, values: &[String]) -> Result<Response, StoreError> {
        let values = self.schema().normalize(field, values);
        match self.store.add_value(site, field, &values)? {
            Mutation::Applied(members) => {
                Ok(self.now_reply(site, field, Some(FieldValue::Set(members))))
            }
            Mutation::Skipped => Ok(self.missing_site(site)),
        }
    }

    fn cmd_rm(&self, site: &str, field: &str, values: &[String]) -> Result<Response, StoreError> {
        let values = self.schema().normalize(field, values);
        match self.store.remove_value(site, field, &values)? {
            Mutation::Applied(value) => Ok(self.now_reply(site, field, value)),
            Mutation::Skipped => Ok(self.missing_site(site)),
        }
    }

    // -----------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------

    fn cmd_search(&self, field: &str, values: &[String]) -> Result<Response, StoreError> {
        let values = self.schema().normalize(field, values);
        let wanted = values.join(" ");
        let found = self.store.search(field, &values)?;
        if found.is_empty() {
            return Ok(Response::line(format!(
                "No sites found with `{}` = `{}`",
                field, wanted
            )));
        }
        let names: Vec<&str> = found.iter().map(|r| r.name.as_str()).collect();
        Ok(Response::line(format!(
            "{} {}",
            bold(&format!("Sites with {} = {}:", field, wanted)),
            names.join(" ")
        )))
    }

    // -----------------------------------------------------------------
    // Reply helpers
    // -----------------------------------------------------------------

    fn missing_site(&self, site: &str) -> Response {
        Response::line(format!("Site `{}` does not exist!", self.schema().normalize_key(site)))
    }

    fn now_reply(&self, site: &str, field: &str, value: Option<FieldValue>) -> Response {
        let site = self.schema().normalize_key(site);
        match value.map(|v| v.to_string()).filter(|v| !v.is_empty()) {
            Some(v) => Response::line(format!("`{}` for `{}` is now: {}", field, site, v)),
            None => Response::line(format!("`{}` for `{}` is now empty.", field, site)),
        }
    }

    fn valid_fields_line(&self) -> String {
        let names: Vec<&str> = self.schema().valid_field_names().into_iter().collect();
        format!("{} {}", bold("Valid fields:"), names.join(" "))
    }

    fn error_reply(&self, err: StoreError) -> Response {
        match err {
            StoreError::AlreadyExists { name } => {
                Response::line(format!("`{}` is already added!", name))
            }
            StoreError::InvalidField { field } => Response::line(format!(
                "`{}` is an invalid field! Use the set command to see valid fields.",
                field
            )),
            StoreError::InvalidType { field, expected } => Response::line(format!(
                "Field `{}` must be of type: `{}`",
                field, expected
            )),
            StoreError::NotASet { field } => Response::line(format!(
                "Field `{}` is not a list field! Use the set command instead.",
                field
            )),
            StoreError::ReadOnlyField { field } => {
                Response::line(format!("Field `{}` cannot be changed!", field))
            }
            StoreError::Backend(e) => {
                tracing::error!(error = %e, "store backend failure");
                Response::line(GENERIC_FAILURE)
            }
        }
    }
}


// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
