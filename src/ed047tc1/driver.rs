//! ED047TC1 Driver Implementation
//!
//! [`Epd`] owns a [`PanelInterface`] and turns areas and packed images into
//! frames.
//!
//! ### Power
//! - `new()` / `with_config()` - initialize the interface, panel unpowered
//! - `power_on()` / `power_off()` - switch the high voltage rails
//! - `power_off_all()` - release every line and hand back the interface
//!
//! ### Drawing
//! - `push_pixels()` - one frame driving every pixel of an area one way
//! - `clear()` / `clear_area()` / `clear_area_cycles()` - flash an area
//!   black and white a few times to get rid of ghosting
//! - `draw_grayscale_image()` / `draw_image()` - a packed 4-bit image as a
//!   series of 1-bit frames
//! - `draw_frame_1bit()` - one frame from a bit plane
//!
//! ## Grayscale
//!
//! An image is drawn in [`GRAY_PASSES`] passes. In pass `k` a pixel of gray
//! `g` is driven if `g + k < 15` (dark ink and erasing) or `g > k` (white
//! ink), so each pixel is driven once per gray step it is away from the
//! background. Passes get longer towards the end, see
//! [`DriverConfig::dark_times_us`]. Passes that would not drive a single
//! pixel are left out. Each pass is a 1-bit frame and goes out through the
//! same frame path as [`Epd::draw_frame_1bit`].
//!
//! ## Timing
//!
//! Every row goes out inside a critical section; an interrupt in the
//! middle of a row would stretch its pulse and show up as a streak. On
//! Xtensa the frame loop is placed in instruction RAM.

use crate::{
    ed047tc1::{cmd::Cmd, full_screen, interface::PanelInterface, GRAY_PASSES, HEIGHT, LINE_BYTES},
    font::text::ImageSink,
    framebuffer::{packed_nibble, packed_stride, Rect},
    mode::{DrawMode, Polarity},
    Error, Result,
};

/// Runtime driver settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverConfig {
    /// Black/white cycles of [`Epd::clear_area`]
    pub clear_cycles: u32,
    /// Frame time of the clearing frames, in µs
    pub clear_cycle_time_us: u32,
    /// Frames per color in one clearing cycle
    pub pushes_per_phase: u32,
    /// Frame time per grayscale pass when darkening, in µs
    pub dark_times_us: [u32; GRAY_PASSES],
    /// Frame time per grayscale pass when lightening, in µs
    pub light_times_us: [u32; GRAY_PASSES],
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            clear_cycles: 3,
            clear_cycle_time_us: 50,
            pushes_per_phase: 4,
            dark_times_us: [30, 30, 20, 20, 30, 30, 30, 40, 40, 50, 50, 50, 100, 200, 300],
            light_times_us: [10, 10, 8, 8, 8, 8, 8, 10, 10, 15, 15, 20, 20, 100, 300],
        }
    }
}

impl DriverConfig {
    /// Frame time of grayscale pass `pass`
    pub fn pass_time_us(&self, polarity: Polarity, pass: usize) -> u32 {
        let table = match polarity {
            Polarity::Darken => &self.dark_times_us,
            Polarity::Lighten => &self.light_times_us,
        };
        table[pass.min(GRAY_PASSES - 1)]
    }
}

/// ED047TC1 e-paper panel driver
///
/// ## Type Parameters
///
/// - `I` - the hardware behind the panel, see [`crate::DisplayInterface`]
pub struct Epd<I> {
    interface: I,
    config: DriverConfig,
    powered: bool,
    /// Drive codes of the row being sent
    row: [u8; LINE_BYTES],
}

impl<I: PanelInterface> Epd<I> {
    /// Create the driver with default settings and initialize the panel
    pub fn new(interface: I) -> Result<Self> {
        Self::with_config(interface, DriverConfig::default())
    }

    /// Create the driver and initialize the panel
    pub fn with_config(mut interface: I, config: DriverConfig) -> Result<Self> {
        interface.init()?;
        log::info!("ED047TC1 ready, {:?}", config);
        Ok(Epd {
            interface,
            config,
            powered: false,
            row: [Cmd::NOOP; LINE_BYTES],
        })
    }

    /// Settings in use
    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    /// The hardware interface
    pub fn interface(&self) -> &I {
        &self.interface
    }

    /// Whether the high voltage rails are up
    pub fn is_powered(&self) -> bool {
        self.powered
    }

    /// Power up the panel
    pub fn power_on(&mut self) -> Result<()> {
        log::info!("Powering on the panel");
        self.interface.power_on()?;
        self.powered = true;
        Ok(())
    }

    /// Power down the panel. The picture stays.
    pub fn power_off(&mut self) -> Result<()> {
        log::info!("Powering off the panel");
        self.interface.power_off()?;
        self.powered = false;
        Ok(())
    }

    /// Power down and release every line. Ends the driver's lifetime.
    pub fn power_off_all(mut self) -> Result<I> {
        log::info!("Releasing the panel");
        self.interface.power_off_all()?;
        Ok(self.interface)
    }

    fn powered_for(&self, operation: &str) -> bool {
        if !self.powered {
            log::warn!("{} while the panel is powered off, ignored", operation);
        }
        self.powered
    }

    /// Clear the whole screen by flashing it.
    pub fn clear(&mut self) -> Result<()> {
        self.clear_area(full_screen())
    }

    /// Clear an area by flashing it.
    pub fn clear_area(&mut self, area: Rect) -> Result<()> {
        self.clear_area_cycles(area, self.config.clear_cycles, self.config.clear_cycle_time_us)
    }

    /// Clear an area by flashing it black and white `cycles` times,
    /// `cycle_time_us` per frame.
    pub fn clear_area_cycles(&mut self, area: Rect, cycles: u32, cycle_time_us: u32) -> Result<()> {
        if area.is_empty() || !self.powered_for("clear") {
            return Ok(());
        }
        log::info!("Clearing {:?}, {} cycles", area, cycles);
        for _ in 0..cycles {
            for _ in 0..self.config.pushes_per_phase {
                self.push_pixels(area, cycle_time_us, Polarity::Darken)?;
            }
            for _ in 0..self.config.pushes_per_phase {
                self.push_pixels(area, cycle_time_us, Polarity::Lighten)?;
            }
        }
        Ok(())
    }

    /// Darken or lighten every pixel of an area for `time_us`.
    pub fn push_pixels(&mut self, area: Rect, time_us: u32, polarity: Polarity) -> Result<()> {
        if !self.powered_for("push_pixels") {
            return Ok(());
        }
        let Some(visible) = area.intersection(&full_screen()) else {
            return Ok(());
        };
        let code = Cmd::for_polarity(polarity);
        self.drive_frame(visible, time_us, |_, row| {
            for x in visible.x..visible.right() {
                Cmd::set(row, x as usize, code);
            }
        })
    }

    /// Draw a packed 4-bit image in [`DrawMode::BlackOnWhite`].
    pub fn draw_grayscale_image(&mut self, area: Rect, data: &[u8]) -> Result<()> {
        self.draw_image(area, data, DrawMode::BlackOnWhite)
    }

    /// Draw a packed 4-bit image.
    ///
    /// `data` is `ceil(area.width / 2) * area.height` bytes, high nibble
    /// left. Parts of the area outside the screen are dropped.
    pub fn draw_image(&mut self, area: Rect, data: &[u8], mode: DrawMode) -> Result<()> {
        if area.is_empty() {
            return Ok(());
        }
        let stride = packed_stride(area.width as u32);
        let expected = stride * area.height as usize;
        if data.len() < expected {
            return Err(Error::BufferSize {
                expected,
                actual: data.len(),
            });
        }
        if !self.powered_for("draw_image") {
            return Ok(());
        }
        let Some(visible) = area.intersection(&full_screen()) else {
            return Ok(());
        };

        let (mut darkest, mut lightest) = (0x0F, 0x00);
        for y in visible.y..visible.bottom() {
            for x in visible.x..visible.right() {
                let gray = packed_nibble(data, stride, (x - area.x) as usize, (y - area.y) as usize);
                darkest = gray.min(darkest);
                lightest = gray.max(lightest);
            }
        }
        let extreme = match mode {
            DrawMode::WhiteOnBlack => lightest,
            DrawMode::BlackOnWhite | DrawMode::WhiteOnWhite => darkest,
        };

        let polarity = mode.polarity();
        let code = Cmd::for_polarity(polarity);
        for pass in 0..GRAY_PASSES as u8 {
            if !mode.drives(extreme, pass) {
                continue;
            }
            let time_us = self.config.pass_time_us(polarity, pass as usize);
            log::debug!("{:?} pass {} for {} us", mode, pass, time_us);
            self.drive_frame(visible, time_us, |y, row| {
                let src = &data[stride * (y - area.y) as usize..][..stride];
                for x in visible.x..visible.right() {
                    if mode.drives(packed_nibble(src, 0, (x - area.x) as usize, 0), pass) {
                        Cmd::set(row, x as usize, code);
                    }
                }
            })?;
        }
        Ok(())
    }

    /// Drive one frame from a bit plane.
    ///
    /// Every set bit drives its pixel in the direction of `mode` for
    /// `time_us`. Rows are `ceil(area.width / 8)` bytes, the most
    /// significant bit is the leftmost pixel.
    pub fn draw_frame_1bit(&mut self, area: Rect, plane: &[u8], mode: DrawMode, time_us: u32) -> Result<()> {
        if area.is_empty() {
            return Ok(());
        }
        let stride = (area.width as usize + 7) / 8;
        let expected = stride * area.height as usize;
        if plane.len() < expected {
            return Err(Error::BufferSize {
                expected,
                actual: plane.len(),
            });
        }
        if !self.powered_for("draw_frame_1bit") {
            return Ok(());
        }
        let Some(visible) = area.intersection(&full_screen()) else {
            return Ok(());
        };
        let code = Cmd::for_polarity(mode.polarity());
        self.drive_frame(visible, time_us, |y, row| {
            let src = &plane[stride * (y - area.y) as usize..][..stride];
            for x in visible.x..visible.right() {
                let i = (x - area.x) as usize;
                if src[i / 8] & (0x80 >> (i % 8)) != 0 {
                    Cmd::set(row, x as usize, code);
                }
            }
        })
    }

    /// Send one frame. `fill_row` sets the drive codes of each row inside
    /// `visible`; every other row is skipped.
    #[cfg_attr(target_arch = "xtensa", link_section = ".rwtext")]
    fn drive_frame<F>(&mut self, visible: Rect, time_us: u32, mut fill_row: F) -> Result<()>
    where
        F: FnMut(i32, &mut [u8]),
    {
        self.interface.start_frame()?;
        for y in 0..HEIGHT as i32 {
            if y < visible.y || y >= visible.bottom() {
                self.interface.skip_row()?;
                continue;
            }
            self.row.fill(Cmd::NOOP);
            fill_row(y, &mut self.row);
            let (interface, row) = (&mut self.interface, &self.row);
            critical_section::with(|_| interface.write_row(row, time_us))?;
        }
        self.interface.end_frame()?;
        Ok(())
    }
}

impl<I: PanelInterface> ImageSink for Epd<I> {
    type Error = Error;

    fn draw_image(&mut self, area: Rect, data: &[u8], mode: DrawMode) -> Result<()> {
        Epd::draw_image(self, area, data, mode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ed047tc1::WIDTH, DisplayError};
    use alloc::vec::Vec;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Init,
        PowerOn,
        PowerOff,
        PowerOffAll,
        StartFrame,
        Row(Vec<u8>, u32),
        Skip,
        EndFrame,
    }

    #[derive(Default)]
    struct Recorder {
        calls: Vec<Call>,
    }

    impl PanelInterface for Recorder {
        fn init(&mut self) -> core::result::Result<(), DisplayError> {
            self.calls.push(Call::Init);
            Ok(())
        }
        fn power_on(&mut self) -> core::result::Result<(), DisplayError> {
            self.calls.push(Call::PowerOn);
            Ok(())
        }
        fn power_off(&mut self) -> core::result::Result<(), DisplayError> {
            self.calls.push(Call::PowerOff);
            Ok(())
        }
        fn power_off_all(&mut self) -> core::result::Result<(), DisplayError> {
            self.calls.push(Call::PowerOffAll);
            Ok(())
        }
        fn start_frame(&mut self) -> core::result::Result<(), DisplayError> {
            self.calls.push(Call::StartFrame);
            Ok(())
        }
        fn write_row(&mut self, row: &[u8], time_us: u32) -> core::result::Result<(), DisplayError> {
            self.calls.push(Call::Row(row.to_vec(), time_us));
            Ok(())
        }
        fn skip_row(&mut self) -> core::result::Result<(), DisplayError> {
            self.calls.push(Call::Skip);
            Ok(())
        }
        fn end_frame(&mut self) -> core::result::Result<(), DisplayError> {
            self.calls.push(Call::EndFrame);
            Ok(())
        }
    }

    /// Frames as lists of rows, `None` for skipped rows
    fn frames(calls: &[Call]) -> Vec<Vec<Option<(Vec<u8>, u32)>>> {
        let mut out = Vec::new();
        for call in calls {
            match call {
                Call::StartFrame => out.push(Vec::new()),
                Call::Row(data, time) => out.last_mut().unwrap().push(Some((data.clone(), *time))),
                Call::Skip => out.last_mut().unwrap().push(None),
                _ => {}
            }
        }
        out
    }

    fn code_at(row: &[u8], x: usize) -> u8 {
        (row[x / 4] >> (6 - 2 * (x % 4))) & 0b11
    }

    fn powered_epd() -> Epd<Recorder> {
        let mut epd = Epd::new(Recorder::default()).unwrap();
        epd.power_on().unwrap();
        epd
    }

    #[test]
    fn test_new_only_initializes() {
        let epd = Epd::new(Recorder::default()).unwrap();
        assert_eq!(epd.interface().calls, vec![Call::Init]);
        assert!(!epd.is_powered());
    }

    #[test]
    fn test_drawing_unpowered_is_ignored() {
        let mut epd = Epd::new(Recorder::default()).unwrap();
        epd.clear().unwrap();
        epd.push_pixels(full_screen(), 10, Polarity::Darken).unwrap();
        epd.draw_grayscale_image(Rect::new(0, 0, 2, 1), &[0x00]).unwrap();
        epd.draw_frame_1bit(Rect::new(0, 0, 8, 1), &[0xFF], DrawMode::BlackOnWhite, 10)
            .unwrap();
        assert_eq!(epd.interface().calls, vec![Call::Init]);
    }

    #[test]
    fn test_push_pixels_frame_layout() {
        let mut epd = powered_epd();
        epd.push_pixels(Rect::new(2, 1, 5, 2), 25, Polarity::Lighten).unwrap();
        let frames = frames(&epd.interface().calls);
        assert_eq!(frames.len(), 1);
        let rows = &frames[0];
        assert_eq!(rows.len(), HEIGHT as usize);
        assert!(rows[0].is_none());
        assert!(rows[3].is_none());
        for y in 1..3 {
            let (row, time) = rows[y].as_ref().unwrap();
            assert_eq!(row.len(), LINE_BYTES);
            assert_eq!(*time, 25);
            for x in 0..10 {
                let expected = if (2..7).contains(&x) { Cmd::LIGHTEN } else { Cmd::NOOP };
                assert_eq!(code_at(row, x), expected, "pixel {}", x);
            }
        }
        assert_eq!(epd.interface().calls.last(), Some(&Call::EndFrame));
    }

    #[test]
    fn test_clear_cycles_alternate_polarity() {
        let mut epd = powered_epd();
        epd.clear_area_cycles(Rect::new(0, 0, 4, 1), 2, 50).unwrap();
        let frames = frames(&epd.interface().calls);
        assert_eq!(frames.len(), 2 * 2 * 4);
        let codes: Vec<u8> = frames
            .iter()
            .map(|f| code_at(&f[0].as_ref().unwrap().0, 0))
            .collect();
        let mut expected = Vec::new();
        for _ in 0..2 {
            expected.extend([Cmd::DARKEN; 4]);
            expected.extend([Cmd::LIGHTEN; 4]);
        }
        assert_eq!(codes, expected);
    }

    #[test]
    fn test_gray_levels_set_pulse_counts() {
        let mut epd = powered_epd();
        // Grays 0, 7, 14, 15
        epd.draw_grayscale_image(Rect::new(0, 0, 4, 1), &[0x07, 0xEF]).unwrap();
        let frames = frames(&epd.interface().calls);
        assert_eq!(frames.len(), GRAY_PASSES);

        let mut pulses = [0; 4];
        for (pass, frame) in frames.iter().enumerate() {
            let (row, time) = frame[0].as_ref().unwrap();
            assert_eq!(*time, epd.config().dark_times_us[pass]);
            for (x, count) in pulses.iter_mut().enumerate() {
                match code_at(row, x) {
                    Cmd::DARKEN => *count += 1,
                    c => assert_eq!(c, Cmd::NOOP),
                }
            }
        }
        assert_eq!(pulses, [15, 8, 1, 0]);
    }

    #[test]
    fn test_white_image_emits_nothing() {
        let mut epd = powered_epd();
        let image = vec![0xFF; 50 * 50];
        epd.draw_grayscale_image(Rect::new(10, 10, 100, 50), &image).unwrap();
        assert!(frames(&epd.interface().calls).is_empty());
    }

    #[test]
    fn test_white_on_black_uses_light_table() {
        let mut epd = powered_epd();
        // One pixel at gray 2
        epd.draw_image(Rect::new(0, 0, 2, 1), &[0x20], DrawMode::WhiteOnBlack).unwrap();
        let frames = frames(&epd.interface().calls);
        assert_eq!(frames.len(), 2);
        for (pass, frame) in frames.iter().enumerate() {
            let (row, time) = frame[0].as_ref().unwrap();
            assert_eq!(*time, epd.config().light_times_us[pass]);
            assert_eq!(code_at(row, 0), Cmd::LIGHTEN);
            assert_eq!(code_at(row, 1), Cmd::NOOP);
        }
    }

    #[test]
    fn test_short_image_is_rejected() {
        let mut epd = powered_epd();
        assert_eq!(
            epd.draw_image(Rect::new(0, 0, 3, 2), &[0; 3], DrawMode::BlackOnWhite),
            Err(Error::BufferSize {
                expected: 4,
                actual: 3
            })
        );
        assert_eq!(
            epd.draw_frame_1bit(Rect::new(0, 0, 9, 1), &[0xFF], DrawMode::BlackOnWhite, 5),
            Err(Error::BufferSize {
                expected: 2,
                actual: 1
            })
        );
    }

    #[test]
    fn test_gray_pass_matches_bit_plane_frame() {
        let area = Rect::new(6, 3, 4, 1);
        let mut gray = powered_epd();
        // Grays 0, 7, 12, 15
        gray.draw_grayscale_image(area, &[0x07, 0xCF]).unwrap();
        let gray_frames = frames(&gray.interface().calls);

        // Pass 3 drives every gray below 12
        let mut plane = powered_epd();
        let time = plane.config().dark_times_us[3];
        plane
            .draw_frame_1bit(area, &[0b1100_0000], DrawMode::BlackOnWhite, time)
            .unwrap();
        assert_eq!(frames(&plane.interface().calls)[0], gray_frames[3]);
    }

    #[test]
    fn test_frame_1bit_msb_is_left() {
        let mut epd = powered_epd();
        let plane = [0b1000_0001, 0b0100_0000];
        epd.draw_frame_1bit(Rect::new(4, 0, 10, 1), &plane, DrawMode::WhiteOnWhite, 7)
            .unwrap();
        let frames = frames(&epd.interface().calls);
        let (row, time) = frames[0][0].as_ref().unwrap();
        assert_eq!(*time, 7);
        let lit: Vec<usize> = (0..16).filter(|&x| code_at(row, x) == Cmd::LIGHTEN).collect();
        assert_eq!(lit, vec![4, 11, 13]);
    }

    #[test]
    fn test_areas_are_clipped_to_screen() {
        let mut epd = powered_epd();
        epd.push_pixels(Rect::new(WIDTH as i32 - 2, -3, 6, 4), 5, Polarity::Darken)
            .unwrap();
        let frames = frames(&epd.interface().calls);
        assert_eq!(frames[0].iter().filter(|r| r.is_some()).count(), 1);
        let (row, _) = frames[0][0].as_ref().unwrap();
        let dark: Vec<usize> = (0..WIDTH as usize)
            .filter(|&x| code_at(row, x) == Cmd::DARKEN)
            .collect();
        assert_eq!(dark, vec![958, 959]);

        let before = epd.interface().calls.len();
        epd.push_pixels(Rect::new(-10, 0, 10, 10), 5, Polarity::Darken).unwrap();
        epd.clear_area(Rect::new(0, 0, 0, 10)).unwrap();
        assert_eq!(epd.interface().calls.len(), before);
    }

    #[test]
    fn test_power_off_all_returns_interface() {
        let mut epd = powered_epd();
        epd.power_off().unwrap();
        assert!(!epd.is_powered());
        let recorder = epd.power_off_all().unwrap();
        assert_eq!(
            recorder.calls,
            vec![Call::Init, Call::PowerOn, Call::PowerOff, Call::PowerOffAll]
        );
    }

    #[test]
    fn test_epd_as_text_sink() {
        let mut epd = powered_epd();
        ImageSink::draw_image(&mut epd, Rect::new(0, 0, 2, 1), &[0x0F], DrawMode::BlackOnWhite)
            .unwrap();
        assert_eq!(frames(&epd.interface().calls).len(), GRAY_PASSES);
    }
}
