// Copyright (C) 2026  Caprica Software Limited
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

//! Text to speech.

use std::{
    process::{Command, Stdio},
    rc::Rc,
};

use anyhow::{Context, Result, bail};
use tracing::debug;

use crate::{components::Component, error::BotError};

pub(crate) const GREETING: &str = "Hello. I am Pi Bot.";

pub(crate) trait Speaker {
    /// Speaks `text`, returning once it has been spoken.
    fn speak(&self, text: &str) -> Result<()>;
}

/// Speaks by running an external synthesiser such as `espeak`.
pub(crate) struct EspeakSpeaker {
    program: String,
    args: Vec<String>,
}

impl EspeakSpeaker {
    /// # Errors
    ///
    /// Returns [`BotError::Unavailable`] if the command cannot be run.
    pub(crate) fn probe(command: &str) -> Result<Self, BotError> {
        let mut parts = command.split_whitespace().map(str::to_string);
        let program = parts
            .next()
            .ok_or_else(|| BotError::unavailable("speech", "no command configured"))?;
        let args: Vec<String> = parts.collect();

        let status = Command::new(&program)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map_err(|e| BotError::unavailable("speech", format!("{}: {}", program, e)))?;

        if !status.success() {
            return Err(BotError::unavailable("speech", format!("{} exited with {}", program, status)));
        }

        Ok(Self { program, args })
    }
}

impl Speaker for EspeakSpeaker {
    fn speak(&self, text: &str) -> Result<()> {
        debug!(text, "speaking");

        let status = Command::new(&self.program)
            .args(&self.args)
            .arg(text)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .with_context(|| format!("Failed to run {}", self.program))?;

        if !status.success() {
            bail!("{} exited with {}", self.program, status);
        }

        Ok(())
    }
}

/// Registers speech with the orchestrator. The speaker itself is shared with
/// the menu and the wheels narration.
pub(crate) struct Speech {
    speaker: Rc<dyn Speaker>,
}

impl Speech {
    pub(crate) fn new(speaker: Rc<dyn Speaker>) -> Self {
        Self { speaker }
    }

    pub(crate) fn greet(&self) -> Result<()> {
        self.speaker.speak(GREETING)
    }
}

impl Component for Speech {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingSpeaker;

    #[test]
    fn missing_synthesiser_is_unavailable() {
        let err = EspeakSpeaker::probe("pibot-no-such-synthesiser").err().unwrap();
        assert!(matches!(err, BotError::Unavailable { device: "speech", .. }));
        assert!(EspeakSpeaker::probe("").is_err());
    }

    #[test]
    fn greeting_is_spoken() {
        let speaker = RecordingSpeaker::new();
        Speech::new(speaker.clone()).greet().unwrap();
        assert_eq!(speaker.spoken(), vec![GREETING]);
    }
}
