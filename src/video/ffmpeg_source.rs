//! Video file frame source using FFmpeg.
//!
//! Frames are decoded sequentially and converted to RGB24 in memory. The demuxer and decoder are
//! released when the source is dropped.

use ffmpeg_next as ffmpeg;
use image::RgbImage;
use std::path::Path;

use super::VideoOpenError;
use super::frame_source::FrameSource;

pub struct FfmpegVideoSource {
    input: ffmpeg::format::context::Input,
    stream_index: usize,
    decoder: ffmpeg::codec::decoder::Video,
    scaler: ffmpeg::software::scaling::Context,
    frame_count: Option<u64>,
    frames_decoded: u64,
    eof_sent: bool,
    finished: bool,
}

impl FfmpegVideoSource {
    pub fn open(path: &Path) -> Result<Self, VideoOpenError> {
        let open_error = |reason: String| VideoOpenError::Open {
            path: path.display().to_string(),
            reason,
        };
        ffmpeg::init().map_err(|err| open_error(format!("initialize ffmpeg: {}", err)))?;
        let input = ffmpeg::format::input(&path).map_err(|err| open_error(err.to_string()))?;
        let input_stream = input
            .streams()
            .best(ffmpeg::media::Type::Video)
            .ok_or_else(|| open_error("file has no video track".to_string()))?;
        let stream_index = input_stream.index();
        let frame_count = u64::try_from(input_stream.frames())
            .ok()
            .filter(|&frames| frames > 0);
        let context = ffmpeg::codec::context::Context::from_parameters(input_stream.parameters())
            .map_err(|err| open_error(format!("load video decoder parameters: {}", err)))?;
        let decoder = context
            .decoder()
            .video()
            .map_err(|err| open_error(format!("open video decoder: {}", err)))?;

        let scaler = ffmpeg::software::scaling::context::Context::get(
            decoder.format(),
            decoder.width(),
            decoder.height(),
            ffmpeg::util::format::pixel::Pixel::RGB24,
            decoder.width(),
            decoder.height(),
            ffmpeg::software::scaling::flag::Flags::BILINEAR,
        )
        .map_err(|err| open_error(format!("create scaler: {}", err)))?;

        log::info!(
            "opened video {} ({}x{}, {} frames)",
            path.display(),
            decoder.width(),
            decoder.height(),
            frame_count.map_or_else(|| "unknown".to_string(), |n| n.to_string())
        );

        Ok(Self {
            input,
            stream_index,
            decoder,
            scaler,
            frame_count,
            frames_decoded: 0,
            eof_sent: false,
            finished: false,
        })
    }

    fn decode_next(&mut self) -> Result<Option<RgbImage>, ffmpeg::Error> {
        let mut decoded = ffmpeg::frame::Video::empty();
        loop {
            if self.decoder.receive_frame(&mut decoded).is_ok() {
                let mut rgb_frame = ffmpeg::frame::Video::empty();
                self.scaler.run(&decoded, &mut rgb_frame)?;
                return Ok(frame_to_rgb_image(&rgb_frame));
            }
            if self.eof_sent {
                return Ok(None);
            }
            match self.next_packet() {
                Some(packet) => self.decoder.send_packet(&packet)?,
                None => {
                    self.decoder.send_eof()?;
                    self.eof_sent = true;
                }
            }
        }
    }

    fn next_packet(&mut self) -> Option<ffmpeg::Packet> {
        let stream_index = self.stream_index;
        self.input
            .packets()
            .find_map(|(stream, packet)| (stream.index() == stream_index).then_some(packet))
    }
}

impl FrameSource for FfmpegVideoSource {
    fn next_frame(&mut self) -> Option<RgbImage> {
        if self.finished {
            return None;
        }
        match self.decode_next() {
            Ok(Some(frame)) => {
                self.frames_decoded += 1;
                Some(frame)
            }
            Ok(None) => {
                log::debug!("video ended after {} frames", self.frames_decoded);
                self.finished = true;
                None
            }
            Err(err) => {
                log::warn!(
                    "failed to decode frame {}, ending stream: {}",
                    self.frames_decoded + 1,
                    err
                );
                self.finished = true;
                None
            }
        }
    }

    fn frame_count_hint(&self) -> Option<u64> {
        self.frame_count
    }
}

fn frame_to_rgb_image(frame: &ffmpeg::frame::Video) -> Option<RgbImage> {
    let width = frame.width();
    let height = frame.height();
    let row_bytes = (width as usize) * 3;
    let stride = frame.stride(0);
    let data = frame.data(0);

    let mut pixels = Vec::with_capacity(row_bytes * height as usize);
    for row in 0..height as usize {
        let start = row * stride;
        pixels.extend_from_slice(data.get(start..start + row_bytes)?);
    }
    RgbImage::from_raw(width, height, pixels)
}
