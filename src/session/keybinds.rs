use super::commands::{Command, KeyInput};
use super::plot_state::{BlockingToken, PickSequence, canonical_box};
use super::session::{Effect, Session, error, status};
use super::text_entry::{
    TextEntry, TextOutcome, TextTarget, parse_rest_wavelength, redshift_from_line,
};
use crate::measure::{Continuum, GaussianLineFitter, Value, measure_equivalent_width};
use crate::spectrum::collection::parse_smooth_width;

impl Session {
    /// Handles one key press at the current pointer position.
    ///
    /// In text-entry mode every key goes to the text buffer. Otherwise the key is looked up
    /// in the command map; unknown keys are ignored.
    pub fn handle_key(&mut self, key: KeyInput) -> Vec<Effect> {
        if self.state.in_text_entry() {
            return self.handle_text_key(key);
        }

        match key {
            KeyInput::Char(c) => match Command::from_key(c) {
                Some(command) => self.run_command(command),
                None => Vec::new(),
            },
            _ => Vec::new(),
        }
    }

    fn admits(&self, command: Command) -> bool {
        match command {
            Command::ZoomBox => self.state.may_proceed(BlockingToken::ZoomBox),
            Command::EquivalentWidth => self.state.may_proceed(BlockingToken::EquivalentWidth),
            Command::GaussianFit => self.state.may_proceed(BlockingToken::GaussianFit),
            Command::Baseline | Command::RedshiftMark | Command::Smooth => {
                self.state.blocking.is_none()
            }
            _ => true,
        }
    }

    pub fn run_command(&mut self, command: Command) -> Vec<Effect> {
        if !self.admits(command) {
            let busy = self.state.blocking.map(|token| token.to_string()).unwrap_or_default();
            return vec![status(format!(
                "'{}' ignored while the {busy} is in progress",
                command.keys()
            ))];
        }

        match (command, self.pointer) {
            (Command::ZoomBox, Some(at)) => self.zoom_box(at),
            (Command::EquivalentWidth, Some(at)) => self.equivalent_width(at),
            (Command::GaussianFit, Some(at)) => self.gaussian_fit(at[0]),
            (Command::RedshiftMark, Some(at)) => self.mark_redshift(at[0]),
            (Command::AddTrim, Some(at)) => self.add_trim(at[0]),
            (Command::DeleteTrim, Some(at)) => self.delete_trim(at[0]),
            (Command::RepositionTrim, Some(at)) => self.reposition_trim(at[0]),

            (Command::Baseline, _) => self.baseline(),
            (Command::ResetView, _) => self.cancel_and_reset_view(),
            (Command::Smooth, _) => {
                self.start_text_entry(TextTarget::SmoothWidth, BlockingToken::Smooth)
            }

            (Command::ZoomOutX, _) => {
                self.resize_x(self.settings.zoom_out_fraction, "o", "zoom out")
            }
            (Command::ZoomInX, _) => self.resize_x(-self.settings.zoom_in_fraction, "i", "zoom in"),
            (Command::ZoomOutY, _) => {
                self.resize_y(self.settings.zoom_out_fraction, "O", "zoom out")
            }
            (Command::ZoomInY, _) => self.resize_y(-self.settings.zoom_in_fraction, "I", "zoom in"),
            (Command::PanRight, _) => self.shift_x(self.settings.pan_fraction, "+", "moving right"),
            (Command::PanLeft, _) => self.shift_x(-self.settings.pan_fraction, "-", "moving left"),
            (Command::PanUp, _) => self.shift_y(self.settings.pan_fraction, "'", "moving up"),
            (Command::PanDown, _) => self.shift_y(-self.settings.pan_fraction, "/", "moving down"),

            (_, None) => {
                log::debug!("'{}' needs the pointer over the plot", command.keys());
                Vec::new()
            }
        }
    }

    fn zoom_box(&mut self, at: [f64; 2]) -> Vec<Effect> {
        match self.state.zoom {
            PickSequence::AwaitingSecond(first) => {
                let view = canonical_box(first, at);
                self.state.view = view;
                self.state.zoom = PickSequence::Done(view);
                self.state.blocking = None;

                vec![
                    status(format!(
                        "'a': zoom box marked as (x0, y0, x1, y1) = {:.2}, {:.2}, {:.2}, {:.2}",
                        view[0], view[1], view[2], view[3]
                    )),
                    Effect::Redraw,
                ]
            }
            _ => {
                self.state.zoom = PickSequence::AwaitingSecond(at);
                self.state.blocking = Some(BlockingToken::ZoomBox);
                vec![status("'a': mark the other corner of the zoom box")]
            }
        }
    }

    fn baseline(&mut self) -> Vec<Effect> {
        let view = &mut self.state.view;
        if view[3] > 0.0 {
            view[1] = 0.0;
        } else {
            view[3] = 0.0;
        }

        vec![
            status(format!("'b': set (y0, y1) = {:.2}, {:.2}", view[1], view[3])),
            Effect::Redraw,
        ]
    }

    fn cancel_and_reset_view(&mut self) -> Vec<Effect> {
        self.state.zoom.discard_pending();
        self.state.continuum.discard_pending();
        self.state.gauss_window.discard_pending();
        self.state.blocking = None;

        self.reset_view();
        let view = self.state.view;

        vec![
            status(format!(
                "'c': reset (x0, y0, x1, y1) to {:.2}, {:.2}, {:.2}, {:.2}",
                view[0], view[1], view[2], view[3]
            )),
            Effect::Redraw,
        ]
    }

    fn equivalent_width(&mut self, at: [f64; 2]) -> Vec<Effect> {
        let PickSequence::AwaitingSecond(first) = self.state.continuum else {
            self.state.continuum = PickSequence::AwaitingSecond(at);
            self.state.blocking = Some(BlockingToken::EquivalentWidth);
            return vec![
                status("'e': mark the other point for continuum level"),
                Effect::Redraw,
            ];
        };

        self.state.blocking = None;

        let Some(spectrum) = self.collection.first() else {
            self.state.continuum = PickSequence::Idle;
            return vec![error("'e': no spectrum loaded"), Effect::Redraw];
        };

        let continuum = Continuum::new(first, at);
        let measurement = measure_equivalent_width(&spectrum.measurement_view(), &continuum);

        self.state.continuum = PickSequence::Done(continuum);
        self.state.ew = measurement.ew;
        self.state.flux = measurement.flux;

        vec![
            status(format!(
                "'e': EW = {}; Flux = {}",
                measurement.ew, measurement.flux
            )),
            Effect::Redraw,
            Effect::RefreshTables,
        ]
    }

    fn gaussian_fit(&mut self, x: f64) -> Vec<Effect> {
        let PickSequence::AwaitingSecond(first) = self.state.gauss_window else {
            self.state.gauss_window = PickSequence::AwaitingSecond(x);
            self.state.blocking = Some(BlockingToken::GaussianFit);
            return vec![
                status("'k': mark the other limit for Gaussian fitting"),
                Effect::Redraw,
            ];
        };

        self.state.blocking = None;

        let Some(spectrum) = self.collection.first() else {
            self.state.gauss_window = PickSequence::Idle;
            return vec![error("'k': no spectrum loaded"), Effect::Redraw];
        };

        let window = [first.min(x), first.max(x)];
        self.state.gauss_window = PickSequence::Done(window);

        let fit = GaussianLineFitter::new(&spectrum.working(), window)
            .with_max_iterations(self.settings.fit_max_iterations)
            .fit();

        let report = match fit {
            Ok(fit) => {
                self.state.ew = fit.ew;
                self.state.flux = fit.flux;
                self.state.gauss_center = fit.center;
                self.state.gauss_model = Some(fit.model);
                status(format!(
                    "'k': EW = {}; Flux = {}; w0 = {}",
                    fit.ew, fit.flux, fit.center
                ))
            }
            Err(e) => {
                self.state.ew = Value::UNDEFINED;
                self.state.flux = Value::UNDEFINED;
                self.state.gauss_center = Value::UNDEFINED;
                self.state.gauss_model = None;
                error(format!("'k': Gaussian fit failed: {e}"))
            }
        };

        vec![report, Effect::Redraw, Effect::RefreshTables]
    }

    fn resize_x(&mut self, fraction: f64, key: &str, action: &str) -> Vec<Effect> {
        let view = &mut self.state.view;
        let width = view[2] - view[0];
        view[0] -= fraction * width;
        view[2] += fraction * width;
        let message = format!("'{key}': {action} (x0, x1) to ({:.2}, {:.2})", view[0], view[2]);
        vec![status(message), Effect::Redraw]
    }

    fn resize_y(&mut self, fraction: f64, key: &str, action: &str) -> Vec<Effect> {
        let view = &mut self.state.view;
        let height = view[3] - view[1];
        view[1] -= fraction * height;
        view[3] += fraction * height;
        let message = format!("'{key}': {action} (y0, y1) to ({:.2}, {:.2})", view[1], view[3]);
        vec![status(message), Effect::Redraw]
    }

    fn shift_x(&mut self, fraction: f64, key: &str, action: &str) -> Vec<Effect> {
        let view = &mut self.state.view;
        let width = view[2] - view[0];
        view[0] += fraction * width;
        view[2] += fraction * width;
        let message = format!("'{key}': {action} (x0, x1) to ({:.2}, {:.2})", view[0], view[2]);
        vec![status(message), Effect::Redraw]
    }

    fn shift_y(&mut self, fraction: f64, key: &str, action: &str) -> Vec<Effect> {
        let view = &mut self.state.view;
        let height = view[3] - view[1];
        view[1] += fraction * height;
        view[3] += fraction * height;
        let message = format!("'{key}': {action} (y0, y1) to ({:.2}, {:.2})", view[1], view[3]);
        vec![status(message), Effect::Redraw]
    }

    fn mark_redshift(&mut self, x: f64) -> Vec<Effect> {
        self.state.redshift_line = x;
        let mut effects =
            self.start_text_entry(TextTarget::RestWavelength, BlockingToken::RedshiftMark);
        effects.push(Effect::Redraw);
        effects
    }

    fn start_text_entry(&mut self, target: TextTarget, token: BlockingToken) -> Vec<Effect> {
        self.state.blocking = Some(token);
        self.state.text_entry = Some(TextEntry::new(target));
        vec![status(target.prompt())]
    }

    fn add_trim(&mut self, x: f64) -> Vec<Effect> {
        self.state.trim_lines.push(x);
        vec![
            status(format!("'t': adding trim line at {x:.4}")),
            Effect::Redraw,
            Effect::RefreshTables,
        ]
    }

    fn delete_trim(&mut self, x: f64) -> Vec<Effect> {
        let Some(index) = self.state.nearest_trim_line(x) else {
            return Vec::new();
        };

        let removed = self.state.trim_lines.remove(index);
        vec![
            status(format!("'d': removing trim line at {removed:.4}")),
            Effect::Redraw,
            Effect::RefreshTables,
        ]
    }

    fn reposition_trim(&mut self, x: f64) -> Vec<Effect> {
        let Some(index) = self.state.nearest_trim_line(x) else {
            return Vec::new();
        };

        let old = std::mem::replace(&mut self.state.trim_lines[index], x);
        vec![
            status(format!("'r': repositioning trim line from {old:.4} to {x:.4}")),
            Effect::Redraw,
            Effect::RefreshTables,
        ]
    }

    fn handle_text_key(&mut self, key: KeyInput) -> Vec<Effect> {
        let Some(entry) = self.state.text_entry.as_mut() else {
            return Vec::new();
        };
        let target = entry.target;
        let outcome = entry.handle(key);
        let line = entry.status_line();

        match outcome {
            TextOutcome::Editing => vec![Effect::Status(line)],
            TextOutcome::Aborted => {
                self.finish_text_entry();
                self.state.redshift_line = f64::NAN;
                vec![status("Escaped"), Effect::Redraw]
            }
            TextOutcome::Submitted(text) => {
                self.finish_text_entry();
                let mut effects = match target {
                    TextTarget::RestWavelength => self.apply_rest_wavelength(&text),
                    TextTarget::SmoothWidth => self.apply_smooth_width(&text),
                };
                effects.extend([Effect::Redraw, Effect::RefreshTables]);
                effects
            }
        }
    }

    fn finish_text_entry(&mut self) {
        self.state.text_entry = None;
        self.state.blocking = None;
    }

    fn apply_rest_wavelength(&mut self, text: &str) -> Vec<Effect> {
        let observed = std::mem::replace(&mut self.state.redshift_line, f64::NAN);

        match parse_rest_wavelength(text) {
            Ok(rest) => {
                self.state.redshift = redshift_from_line(observed, rest);
                vec![status(format!(
                    "'m': redshift set to {:.6}",
                    self.state.redshift
                ))]
            }
            Err(e) => vec![error(format!("'m': {e}"))],
        }
    }

    fn apply_smooth_width(&mut self, text: &str) -> Vec<Effect> {
        match parse_smooth_width(text) {
            Ok(width) => {
                self.collection.smooth_all(width);
                vec![status(format!("'s': spectra smoothed with {width} pixels"))]
            }
            Err(e) => vec![error(format!("'s': {e}, use integer numbers"))],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::measure::GaussianParams;
    use crate::session::plot_state::PlotState;
    use crate::spectrum::{RawSpectrum, Spectrum};

    fn flat_session() -> Session {
        let wave: Vec<f64> = (4000..=5000).map(f64::from).collect();
        let n = wave.len();
        let raw = RawSpectrum::new(wave, vec![10.0; n], Some(vec![1.0; n]));

        let mut session = Session::default();
        session.add_spectrum(Spectrum::new("flat.txt", raw).expect("valid spectrum"));
        session.reset_view();
        session
    }

    fn line_session(params: GaussianParams) -> Session {
        let wave: Vec<f64> = (0..240).map(|i| 6500.0 + 0.5 * i as f64).collect();
        let flux = wave.iter().map(|&x| params.evaluate(x)).collect();

        let mut session = Session::default();
        session.add_spectrum(
            Spectrum::new("line.txt", RawSpectrum::new(wave, flux, None)).expect("valid spectrum"),
        );
        session
    }

    fn press_at(session: &mut Session, key: char, x: f64, y: f64) -> Vec<Effect> {
        session.set_pointer(Some([x, y]));
        session.handle_key(KeyInput::Char(key))
    }

    fn type_text(session: &mut Session, text: &str) -> Vec<Effect> {
        for c in text.chars() {
            session.handle_key(KeyInput::Char(c));
        }
        session.handle_key(KeyInput::Enter)
    }

    // NaN fields never compare equal, the debug text does
    fn snapshot(state: &PlotState) -> String {
        format!("{state:?}")
    }

    fn assert_view(found: [f64; 4], expected: [f64; 4]) {
        for (f, e) in found.iter().zip(expected) {
            assert!((f - e).abs() < 1e-12, "{found:?} != {expected:?}");
        }
    }

    fn has_error(effects: &[Effect]) -> bool {
        effects.iter().any(|e| matches!(e, Effect::Error(_)))
    }

    #[test]
    fn flat_continuum_gives_zero_width() {
        let mut session = flat_session();

        press_at(&mut session, 'e', 4000.0, 10.0);
        assert_eq!(session.state().blocking, Some(BlockingToken::EquivalentWidth));

        let effects = press_at(&mut session, 'e', 5000.0, 10.0);
        assert!(effects.contains(&Effect::RefreshTables));

        let state = session.state();
        assert_eq!(state.blocking, None);
        assert!(state.ew.value.abs() < 1e-12);
        assert!(state.ew.uncertainty > 0.0);
        assert!(state.flux.value.abs() < 1e-12);
        assert!(state.continuum.done().is_some());
    }

    #[test]
    fn continuum_points_are_sorted() {
        let mut session = flat_session();
        press_at(&mut session, 'e', 4800.0, 11.0);
        press_at(&mut session, 'e', 4200.0, 9.0);

        let continuum = session.state().continuum.done().copied().expect("continuum done");
        assert_eq!(continuum.start, [4200.0, 9.0]);
        assert_eq!(continuum.end, [4800.0, 11.0]);
    }

    #[test]
    fn third_press_starts_a_new_continuum() {
        let mut session = flat_session();
        press_at(&mut session, 'e', 4100.0, 10.0);
        press_at(&mut session, 'e', 4200.0, 10.0);
        press_at(&mut session, 'e', 4300.0, 10.0);

        assert_eq!(
            session.state().continuum,
            PickSequence::AwaitingSecond([4300.0, 10.0])
        );
        assert_eq!(session.state().blocking, Some(BlockingToken::EquivalentWidth));
    }

    #[test]
    fn redshift_from_marked_line() {
        let mut session = flat_session();
        press_at(&mut session, 'm', 6564.6, 1.0);
        assert!(session.state().in_text_entry());
        assert_eq!(session.state().blocking, Some(BlockingToken::RedshiftMark));

        let effects = type_text(&mut session, "6562.8");
        assert!(!has_error(&effects));

        let state = session.state();
        assert!((state.redshift - 0.000274).abs() < 1e-6);
        assert!(state.redshift_line.is_nan());
        assert!(!state.in_text_entry());
        assert_eq!(state.blocking, None);
    }

    #[test]
    fn bad_rest_wavelength_changes_nothing() {
        for text in ["abc", "0", ""] {
            let mut session = flat_session();
            press_at(&mut session, 'm', 6564.6, 1.0);

            let effects = type_text(&mut session, text);
            assert!(has_error(&effects), "{text:?}");

            let state = session.state();
            assert_eq!(state.redshift, 0.0);
            assert!(!state.in_text_entry());
            assert_eq!(state.blocking, None);
        }
    }

    #[test]
    fn escape_abandons_text_entry() {
        let mut session = flat_session();
        press_at(&mut session, 'm', 6564.6, 1.0);
        session.handle_key(KeyInput::Char('6'));
        session.handle_key(KeyInput::Escape);

        let state = session.state();
        assert!(!state.in_text_entry());
        assert_eq!(state.blocking, None);
        assert_eq!(state.redshift, 0.0);
    }

    #[test]
    fn command_keys_are_text_while_typing() {
        let mut session = flat_session();
        press_at(&mut session, 's', 4500.0, 10.0);
        let before = session.state().view;

        press_at(&mut session, 'a', 4500.0, 10.0);
        session.handle_key(KeyInput::Backspace);
        session.handle_key(KeyInput::Char('o'));

        assert_eq!(session.state().view, before);
        assert_eq!(session.state().zoom, PickSequence::Idle);
        assert_eq!(
            session.state().text_entry.as_ref().map(TextEntry::buffer),
            Some("o")
        );
    }

    #[test]
    fn smoothing_from_typed_width() {
        let mut session = flat_session();
        session.handle_key(KeyInput::Char('s'));
        assert_eq!(session.state().blocking, Some(BlockingToken::Smooth));

        type_text(&mut session, "3.9");
        assert!(session.collection().iter().all(|s| s.smooth_width() == 3));
        assert_eq!(session.state().blocking, None);

        session.handle_key(KeyInput::Char('s'));
        let effects = type_text(&mut session, "wide");
        assert!(has_error(&effects));
        assert!(session.collection().iter().all(|s| s.smooth_width() == 3));
        assert_eq!(session.state().blocking, None);
    }

    #[test]
    fn other_commands_wait_for_blocking_owner() {
        let mut session = flat_session();
        press_at(&mut session, 'a', 4100.0, 5.0);
        let pending = snapshot(session.state());

        for key in ['e', 'k', 'm', 's', 'b'] {
            let effects = press_at(&mut session, key, 4100.0, 5.0);
            assert!(matches!(effects.as_slice(), [Effect::Status(_)]), "{key}");
            assert_eq!(snapshot(session.state()), pending, "{key}");
        }

        press_at(&mut session, 'a', 4200.0, 15.0);
        assert_eq!(session.state().blocking, None);
        assert_eq!(session.state().view, [4100.0, 5.0, 4200.0, 15.0]);
    }

    #[test]
    fn zoom_box_corners_are_ordered() {
        let corners = [
            ([10.0, 5.0], [2.0, 1.0]),
            ([2.0, 5.0], [10.0, 1.0]),
            ([10.0, 1.0], [2.0, 5.0]),
        ];
        for (a, b) in corners {
            let mut session = flat_session();
            press_at(&mut session, 'a', a[0], a[1]);
            press_at(&mut session, 'a', b[0], b[1]);
            assert_eq!(session.state().view, [2.0, 1.0, 10.0, 5.0]);
        }
    }

    #[test]
    fn pointer_commands_need_the_pointer() {
        let mut session = flat_session();
        session.set_pointer(None);

        for key in ['a', 'e', 'k', 'm', 't'] {
            assert!(session.handle_key(KeyInput::Char(key)).is_empty());
        }
        assert_eq!(session.state().blocking, None);
        assert!(session.state().trim_lines.is_empty());
    }

    #[test]
    fn baseline_pulls_nearer_limit_to_zero() {
        let mut session = Session::default();

        session.set_view([0.0, 2.0, 10.0, 12.0]);
        session.handle_key(KeyInput::Char('b'));
        assert_eq!(session.state().view, [0.0, 0.0, 10.0, 12.0]);

        session.set_view([0.0, -5.0, 10.0, -1.0]);
        session.handle_key(KeyInput::Char('b'));
        assert_eq!(session.state().view, [0.0, -5.0, 10.0, 0.0]);
    }

    #[test]
    fn pan_and_zoom_keys() {
        let mut session = Session::default();
        let mut after = |key: char, view: [f64; 4]| {
            session.set_view(view);
            session.handle_key(KeyInput::Char(key));
            session.state().view
        };

        assert_view(after('i', [0.0, 0.0, 12.0, 12.0]), [1.0, 0.0, 11.0, 12.0]);
        assert_view(after('I', [0.0, 0.0, 12.0, 12.0]), [0.0, 1.0, 12.0, 11.0]);
        assert_view(after('o', [0.0, 0.0, 10.0, 10.0]), [-1.0, 0.0, 11.0, 10.0]);
        assert_view(after('O', [0.0, 0.0, 10.0, 10.0]), [0.0, -1.0, 10.0, 11.0]);
        assert_view(after('+', [0.0, 0.0, 10.0, 10.0]), [1.0, 0.0, 11.0, 10.0]);
        assert_view(after('=', [0.0, 0.0, 10.0, 10.0]), [1.0, 0.0, 11.0, 10.0]);
        assert_view(after('-', [0.0, 0.0, 10.0, 10.0]), [-1.0, 0.0, 9.0, 10.0]);
        assert_view(after('\'', [0.0, 0.0, 10.0, 10.0]), [0.0, 1.0, 10.0, 11.0]);
        assert_view(after('/', [0.0, 0.0, 10.0, 10.0]), [0.0, -1.0, 10.0, 9.0]);
    }

    #[test]
    fn trim_lines_add_remove_reposition() {
        let mut session = flat_session();

        assert!(press_at(&mut session, 'd', 4500.0, 10.0).is_empty());
        assert!(press_at(&mut session, 'r', 4500.0, 10.0).is_empty());

        press_at(&mut session, 't', 4500.0, 10.0);
        press_at(&mut session, 't', 4700.0, 10.0);
        press_at(&mut session, 't', 4300.0, 10.0);

        // 4500 and 4700 are equally near, the first stored one goes
        press_at(&mut session, 'd', 4600.0, 10.0);
        assert_eq!(session.state().trim_lines, vec![4700.0, 4300.0]);

        press_at(&mut session, 'r', 4400.0, 10.0);
        assert_eq!(session.state().trim_lines, vec![4700.0, 4400.0]);
    }

    #[test]
    fn reset_view_cancels_half_finished_picks() {
        let mut session = flat_session();
        press_at(&mut session, 'e', 4100.0, 10.0);
        press_at(&mut session, 'e', 4200.0, 10.0);
        session.set_view([0.0, 0.0, 1.0, 1.0]);

        press_at(&mut session, 'e', 4300.0, 10.0);
        session.handle_key(KeyInput::Char('c'));
        assert_eq!(session.state().continuum, PickSequence::Idle);
        assert_eq!(session.state().blocking, None);
        assert!((session.state().view[0] - 3950.0).abs() < 1e-9);

        press_at(&mut session, 'k', 4100.0, 10.0);
        press_at(&mut session, 'k', 4200.0, 10.0);
        session.handle_key(KeyInput::Char('c'));
        assert_eq!(session.state().gauss_window.done(), Some(&[4100.0, 4200.0]));
    }

    #[test]
    fn gaussian_fit_from_window() {
        let truth = GaussianParams {
            area: 50.0,
            center: 6563.0,
            sigma: 3.0,
            lin0: 10.0,
            lin1: 0.01,
        };
        let mut session = line_session(truth);

        press_at(&mut session, 'k', 6620.0, 10.0);
        assert_eq!(session.state().blocking, Some(BlockingToken::GaussianFit));
        let effects = press_at(&mut session, 'k', 6500.0, 10.0);
        assert!(!has_error(&effects));

        let state = session.state();
        assert_eq!(state.blocking, None);
        assert!((state.ew.value - 5.0).abs() < 1e-6);
        assert!((state.flux.value - 50.0).abs() < 1e-5);
        assert!((state.gauss_center.value - 6563.0).abs() < 1e-5);
        assert_eq!(state.gauss_model.as_ref().map(Vec::len), Some(240));
    }

    #[test]
    fn failed_fit_leaves_undefined_values() {
        let params = GaussianParams {
            area: 50.0,
            center: 6563.0,
            sigma: 3.0,
            lin0: 0.0,
            lin1: 0.01,
        };
        let mut session = line_session(params);
        session.state.gauss_model = Some(vec![[0.0, 0.0]]);

        press_at(&mut session, 'k', 6500.0, 1.0);
        let effects = press_at(&mut session, 'k', 6620.0, 1.0);
        assert!(has_error(&effects));

        let state = session.state();
        assert!(!state.ew.is_defined());
        assert!(!state.flux.is_defined());
        assert!(!state.gauss_center.is_defined());
        assert!(state.gauss_model.is_none());
        assert_eq!(state.blocking, None);
    }

    #[test]
    fn measuring_without_spectra_is_reported() {
        let mut session = Session::default();
        press_at(&mut session, 'e', 1.0, 1.0);
        let effects = press_at(&mut session, 'e', 2.0, 1.0);

        assert!(has_error(&effects));
        assert_eq!(session.state().continuum, PickSequence::Idle);
        assert_eq!(session.state().blocking, None);
        assert!(!session.state().ew.is_defined());
    }

    #[test]
    fn measurement_uses_transformed_view() {
        let mut session = flat_session();
        session
            .set_transform(0, crate::spectrum::TransformField::Mult, "2")
            .expect("valid multiplier");

        press_at(&mut session, 'e', 4000.0, 10.0);
        press_at(&mut session, 'e', 5000.0, 10.0);

        // flux is 20 against a continuum of 10
        assert!((session.state().ew.value - 999.0).abs() < 1e-9);
        assert!((session.state().flux.value - 9990.0).abs() < 1e-6);
    }

    #[test]
    fn flux_offset_leaves_integrated_errors_alone() {
        let mut plain = flat_session();
        press_at(&mut plain, 'e', 4000.0, 10.0);
        press_at(&mut plain, 'e', 5000.0, 10.0);

        let mut shifted = flat_session();
        shifted
            .set_transform(0, crate::spectrum::TransformField::Add, "5")
            .expect("valid offset");
        press_at(&mut shifted, 'e', 4000.0, 15.0);
        press_at(&mut shifted, 'e', 5000.0, 15.0);

        let (plain, shifted) = (plain.state(), shifted.state());
        assert!(shifted.flux.value.abs() < 1e-9);
        assert!((shifted.flux.uncertainty - plain.flux.uncertainty).abs() < 1e-9);
        // same absolute error against a higher continuum
        assert!((shifted.ew.uncertainty - plain.ew.uncertainty * 10.0 / 15.0).abs() < 1e-9);
    }

    #[test]
    fn huge_smoothing_width_is_survivable() {
        let mut session = flat_session();
        session.handle_key(KeyInput::Char('s'));
        let effects = type_text(&mut session, "1e12");

        assert!(!has_error(&effects));
        assert_eq!(session.state().blocking, None);
        let spectrum = session.collection().first().expect("spectrum");
        assert_eq!(spectrum.spec_display().len(), spectrum.len());
        assert!(spectrum.spec_display().iter().all(|f| (f - 10.0).abs() < 1e-9));
    }

    #[test]
    fn unknown_and_special_keys_in_command_mode() {
        let mut session = flat_session();
        let before = snapshot(session.state());

        for key in [
            KeyInput::Char('x'),
            KeyInput::Enter,
            KeyInput::Escape,
            KeyInput::Backspace,
        ] {
            assert!(session.handle_key(key).is_empty());
        }
        assert_eq!(snapshot(session.state()), before);
    }
}
