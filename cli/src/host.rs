//! Host: the stand-in transport loop. Inbound lines in, chunked and
//! encrypted replies out, with reload handled in-process.

use std::io::{self, BufRead};
use std::path::{Path, PathBuf};

use sitebot_core::errors::SetupError;
use sitebot_core::settings;
use sitebot_core::transport::{decode_inbound, Cipher, Outbox, Sink};
use sitebot_core::types::Settings;
use sitebot_core::{Dispatcher, Response};


pub struct Host {
    config_path: PathBuf,
    settings: Settings,
    dispatcher: Dispatcher,
    cipher: Box<dyn Cipher>,
}

impl Host {
    /// Load settings from `config_path` (defaults if the file is absent)
    /// and build the dispatcher.
    pub fn start(config_path: &Path, cipher: Box<dyn Cipher>) -> Result<Host, SetupError> {
        let settings = settings::load_or_default(config_path)?;
        let dispatcher = Dispatcher::new(&settings)?;
        tracing::info!(
            config = %config_path.display(),
            prefix = %settings.command_prefix,
            max_message_size = settings.max_message_size,
            "sitebot ready"
        );
        Ok(Host {
            config_path: config_path.to_path_buf(),
            settings,
            dispatcher,
            cipher,
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Re-read the settings file and apply it. A bad file is logged and
    /// the running configuration is kept.
    pub fn reload(&mut self) -> Result<(), SetupError> {
        let fresh = settings::load_or_default(&self.config_path)?;
        self.dispatcher.reconfigure(&fresh)?;
        self.settings = fresh;
        Ok(())
    }

    /// Handle one raw inbound line. Returns how many messages were sent.
    pub fn handle(&mut self, raw: &str, sink: &mut dyn Sink) -> io::Result<usize> {
        let line = decode_inbound(self.cipher.as_ref(), raw);
        match self.dispatcher.handle_line(&line) {
            Response::Reply { lines } => {
                let outbox = Outbox::new(self.cipher.as_ref(), self.settings.max_message_size);
                outbox.deliver(&lines, sink)
            }
            Response::Ignored => Ok(0),
            Response::Reload => {
                if let Err(e) = self.reload() {
                    tracing::error!(error = %e, "reload failed, keeping current settings");
                }
                Ok(0)
            }
        }
    }

    /// Process lines until the input ends.
    pub fn run<R: BufRead>(&mut self, input: R, sink: &mut dyn Sink) -> io::Result<()> {
        for line in input.lines() {
            self.handle(&line?, sink)?;
        }
        tracing::info!("input closed, shutting down");
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use sitebot_core::transport::{LineSink, Plaintext};

    fn output(sink: LineSink<Vec<u8>>) -> String {
        String::from_utf8(sink.into_inner()).unwrap()
    }

    #[test]
    fn run_processes_every_line_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let mut host = Host::start(&dir.path().join("settings.yaml"), Box::new(Plaintext)).unwrap();
        let input = "!addsite foo\nhello\n!sites\n";
        let mut sink = LineSink::new(Vec::new());
        host.run(input.as_bytes(), &mut sink).unwrap();
        assert_eq!(output(sink), "Added `FOO`!\n\x02Sites:\x02 FOO\n");
    }

    #[test]
    fn long_replies_are_chunked() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.yaml");
        let mut s = settings::default_settings();
        s.max_message_size = 20;
        settings::save(&path, &s).unwrap();

        let mut host = Host::start(&path, Box::new(Plaintext)).unwrap();
        let mut sink = LineSink::new(Vec::new());
        host.handle("!addsite foo", &mut sink).unwrap();
        let sent = host.handle("!add foo users aaaa bbbb cccc dddd eeee", &mut sink).unwrap();
        assert!(sent > 1);
        let out = output(sink);
        assert!(out.lines().all(|l| l.len() <= 20));
    }

    #[test]
    fn reload_picks_up_new_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.yaml");
        let mut host = Host::start(&path, Box::new(Plaintext)).unwrap();
        let mut sink = LineSink::new(Vec::new());
        host.handle("!addsite foo", &mut sink).unwrap();

        let mut s = settings::default_settings();
        s.command_prefix = '.';
        settings::save(&path, &s).unwrap();
        assert_eq!(host.handle("!reload", &mut sink).unwrap(), 0);
        assert_eq!(host.settings().command_prefix, '.');
        assert_eq!(host.handle("!sites", &mut sink).unwrap(), 0);
        assert_eq!(host.handle(".sites", &mut sink).unwrap(), 1);
    }

    #[test]
    fn broken_settings_on_reload_keep_old_ones() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.yaml");
        let mut host = Host::start(&path, Box::new(Plaintext)).unwrap();
        std::fs::write(&path, "fields: [oops").unwrap();
        let mut sink = LineSink::new(Vec::new());
        host.handle("!reload", &mut sink).unwrap();
        assert_eq!(host.handle("!sites", &mut sink).unwrap(), 1);
    }
}
