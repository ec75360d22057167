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

//! Collision avoidance with an ultrasonic distance sensor.
//!
//! The sensor is off until enabled from the menu. While enabled it takes at
//! most one measurement per interval, shows the distance in the bottom right
//! corner of the display and fires [`Echo::too_close`] whenever an obstacle
//! is nearer than the threshold.
//!
//! A measurement that times out keeps the previous reading. Until the first
//! successful measurement there is no reading at all, so nothing is shown and
//! nothing fires.

use std::{
    cell::{Cell, RefCell},
    rc::Rc,
    time::{Duration, Instant},
};

use anyhow::Result;
use tracing::{debug, info};

use crate::{
    components::Component,
    config::EchoConfig,
    display::SharedDisplay,
    events::EventHandler,
    hardware::RangeFinder,
    menu::Menu,
    util::format::right_align,
};

const READING_ROW: u16 = 1;
const READING_COL: u16 = 10;
const READING_WIDTH: usize = 6;

struct EchoInner {
    finder: RefCell<Box<dyn RangeFinder>>,
    display: SharedDisplay,
    enabled: Cell<bool>,
    last_measured: Cell<Option<Instant>>,
    distance_cm: Cell<Option<f64>>,
    too_close: EventHandler<()>,
    threshold_cm: f64,
    interval: Duration,
    timeout: Duration,
}

#[derive(Clone)]
pub(crate) struct Echo {
    inner: Rc<EchoInner>,
}

impl Echo {
    pub(crate) fn new(finder: Box<dyn RangeFinder>, display: SharedDisplay, config: &EchoConfig) -> Self {
        Self {
            inner: Rc::new(EchoInner {
                finder: RefCell::new(finder),
                display,
                enabled: Cell::new(false),
                last_measured: Cell::new(None),
                distance_cm: Cell::new(None),
                too_close: EventHandler::new("too_close"),
                threshold_cm: config.threshold_cm,
                interval: config.interval(),
                timeout: config.timeout(),
            }),
        }
    }

    pub(crate) fn too_close(&self) -> &EventHandler<()> {
        &self.inner.too_close
    }

    pub(crate) fn is_enabled(&self) -> bool {
        self.inner.enabled.get()
    }

    pub(crate) fn toggle(&self) -> Result<()> {
        let enabled = !self.inner.enabled.get();
        self.inner.enabled.set(enabled);
        info!(enabled, "echo toggled");

        let text = if enabled { "Echo enabled" } else { "Echo disabled" };
        self.inner.display.borrow_mut().show(text)
    }

    /// The last successful reading, if any.
    #[cfg(test)]
    pub(crate) fn distance_cm(&self) -> Option<f64> {
        self.inner.distance_cm.get()
    }

    fn measurement_due(&self) -> bool {
        match self.inner.last_measured.get() {
            Some(last) => last.elapsed() >= self.inner.interval,
            None => true,
        }
    }
}

impl Component for Echo {
    fn poll(&mut self) -> Result<()> {
        if !self.is_enabled() || !self.measurement_due() {
            return Ok(());
        }

        let inner = &self.inner;
        let measured = inner.finder.borrow_mut().measure(inner.timeout);
        inner.last_measured.set(Some(Instant::now()));

        match measured? {
            Some(distance) => inner.distance_cm.set(Some(distance)),
            None => debug!("echo timed out"),
        }

        let Some(distance) = inner.distance_cm.get() else {
            return Ok(());
        };

        if distance < inner.threshold_cm {
            debug!(distance, "obstacle too close");
            inner.too_close.fire(&());
        }

        let text = format!("{}cm", distance as u64);
        if text.len() <= READING_WIDTH {
            inner
                .display
                .borrow_mut()
                .show_at(READING_ROW, READING_COL, &right_align(&text, READING_WIDTH))?;
        }

        Ok(())
    }

    fn cleanup(&mut self) -> Result<()> {
        self.inner.finder.borrow_mut().release()
    }

    fn contribute_menu(&mut self, menu: &Menu) {
        let echo = self.clone();
        menu.add_function("Toggle Echo", Rc::new(move || echo.toggle()), None);
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::testing::{FakeRangeFinder, RecordingDisplay};

    fn config(interval_ms: u64) -> EchoConfig {
        EchoConfig {
            interval_ms,
            ..EchoConfig::default()
        }
    }

    fn echo(readings: &[Option<f64>], interval_ms: u64) -> (Echo, Rc<RefCell<crate::testing::DisplayRecord>>, Rc<Cell<u32>>) {
        let (display, record) = RecordingDisplay::shared(16);
        let echo = Echo::new(Box::new(FakeRangeFinder::new(readings)), display, &config(interval_ms));
        let stops = Rc::new(Cell::new(0));
        let count = Rc::clone(&stops);
        echo.too_close().subscribe(move |_: &()| {
            count.set(count.get() + 1);
            Ok(())
        });
        (echo, record, stops)
    }

    #[test]
    fn disabled_sensor_does_nothing() {
        let (mut echo, record, stops) = echo(&[Some(5.0)], 0);

        echo.poll().unwrap();

        assert_eq!(stops.get(), 0);
        assert_eq!(echo.distance_cm(), None);
        assert!(record.borrow().writes.is_empty());
    }

    #[test]
    fn close_obstacle_fires_and_shows_distance() {
        let (mut echo, record, stops) = echo(&[Some(12.4), Some(40.0)], 0);
        echo.toggle().unwrap();

        echo.poll().unwrap();
        assert_eq!(stops.get(), 1);
        assert_eq!(record.borrow().writes.last().cloned().unwrap(), (1, 10, "  12cm".to_string()));

        echo.poll().unwrap();
        assert_eq!(stops.get(), 1);
        assert_eq!(record.borrow().writes.last().cloned().unwrap(), (1, 10, "  40cm".to_string()));
    }

    #[test]
    fn timeout_keeps_last_reading() {
        let (mut echo, _, stops) = echo(&[Some(10.0), None], 0);
        echo.toggle().unwrap();

        echo.poll().unwrap();
        echo.poll().unwrap();

        assert_eq!(echo.distance_cm(), Some(10.0));
        assert_eq!(stops.get(), 2);
    }

    #[test]
    fn no_reading_before_first_echo() {
        let (mut echo, record, stops) = echo(&[None], 0);
        echo.toggle().unwrap();
        let shown = record.borrow().writes.len();

        echo.poll().unwrap();

        assert_eq!(stops.get(), 0);
        assert_eq!(record.borrow().writes.len(), shown);
    }

    #[test]
    fn measures_at_most_once_per_interval() {
        let (mut echo, _, stops) = echo(&[Some(5.0), Some(5.0)], 60_000);
        echo.toggle().unwrap();

        echo.poll().unwrap();
        echo.poll().unwrap();

        assert_eq!(stops.get(), 1);
    }

    #[test]
    fn oversized_reading_is_not_shown() {
        let (mut echo, record, _) = echo(&[Some(123_456.0)], 0);
        echo.toggle().unwrap();
        let shown = record.borrow().writes.len();

        echo.poll().unwrap();
        assert_eq!(record.borrow().writes.len(), shown);
    }

    #[test]
    fn toggle_menu_entry_reports_state() {
        let (mut echo, record, _) = echo(&[], 0);
        let (display, _) = RecordingDisplay::shared(16);
        let menu = Menu::new(display);
        echo.contribute_menu(&menu);

        menu.invoke(&["Toggle Echo"]).unwrap();
        assert!(echo.is_enabled());
        assert_eq!(record.borrow().shown.last().unwrap(), "Echo enabled");

        menu.invoke(&["Toggle Echo"]).unwrap();
        assert!(!echo.is_enabled());
        assert_eq!(record.borrow().shown.last().unwrap(), "Echo disabled");
    }
}
