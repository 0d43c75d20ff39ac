//! Memory-mapped ITCH 5.0 capture file source
//!
//! On-disk format: `(size: u16 BE, payload: size bytes)` records
//! concatenated with no padding. Payload timestamps are nanoseconds since
//! midnight; the source anchors them to the trading day's midnight in
//! America/New_York.

use crate::source::{HistSource, SourceError};
use chrono::{NaiveDate, TimeZone};
use chrono_tz::America::New_York;
use common::Timestamp;
use itch::fields::be_u16;
use itch::CommonHeader;
use memmap2::{Advice, Mmap, UncheckedAdvice};
use std::fs::File;
use std::ops::Range;
use std::path::Path;
use tracing::error;

/// Chunk granularity for releasing consumed pages back to the OS.
const CHUNK_SIZE: usize = 1 << 22;

/// Replays one day's `nasdaq_itch.<date>.dat` capture.
pub struct ItchHistSource {
    map: Mmap,
    total: usize,
    offset: usize,
    // bytes already released back to the OS, always a multiple of CHUNK_SIZE
    released: usize,
    midnight: Timestamp,
    end_time: Timestamp,
    next_time: Timestamp,
    next_msg: Range<usize>,
}

impl ItchHistSource {
    /// Factory name of this source.
    pub const NAME: &'static str = "nasdaq_itch50";

    /// Open and map `<root>/nasdaq_itch.<date>.dat` (date as YYYYMMDD) and
    /// position the source on the first message.
    ///
    /// # Errors
    /// [`SourceError::BadDate`] for an impossible calendar date,
    /// [`SourceError::Open`] / [`SourceError::Map`] for I/O failures.
    pub fn open(root: &Path, date: u32) -> Result<Self, SourceError> {
        let midnight = Self::midnight_ny(date)?;
        let path = root.join(format!("nasdaq_itch.{date}.dat"));
        let file = File::open(&path).map_err(|source| SourceError::Open {
            path: path.clone(),
            source,
        })?;
        let map = unsafe { Mmap::map(&file) }.map_err(|source| SourceError::Map {
            path: path.clone(),
            source,
        })?;
        // advisory only, failure changes nothing
        let _ = map.advise(Advice::Sequential);

        let total = map.len();
        let mut source = Self {
            map,
            total,
            offset: 0,
            released: 0,
            midnight,
            end_time: Timestamp::MAX,
            next_time: Timestamp::MAX,
            next_msg: 0..0,
        };
        source.advance();
        Ok(source)
    }

    /// Stop delivering messages stamped after `end_time`; reaching one
    /// transitions to end-of-stream exactly as if the file had ended.
    pub fn set_end_time(&mut self, end_time: Timestamp) {
        self.end_time = end_time;
    }

    /// Byte offset of the pending frame's size header.
    #[must_use]
    pub const fn current_offset(&self) -> usize {
        self.offset
    }

    /// Midnight of `date` (YYYYMMDD) in America/New_York as an absolute
    /// timestamp. Daylight-saving transitions follow the zoneinfo database.
    ///
    /// # Errors
    /// [`SourceError::BadDate`] when `date` is not a calendar day.
    pub fn midnight_ny(date: u32) -> Result<Timestamp, SourceError> {
        #[allow(clippy::cast_possible_wrap)]
        let year = (date / 10_000) as i32;
        let month = date / 100 % 100;
        let day = date % 100;
        let naive = NaiveDate::from_ymd_opt(year, month, day)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .ok_or(SourceError::BadDate(date))?;
        let local = New_York
            .from_local_datetime(&naive)
            .earliest()
            .ok_or(SourceError::BadDate(date))?;
        let nanos = local
            .timestamp_nanos_opt()
            .and_then(|n| u64::try_from(n).ok())
            .ok_or(SourceError::BadDate(date))?;
        Ok(Timestamp::from_nanos(nanos))
    }

    /// Release whole consumed chunks behind the cursor so resident memory
    /// stays within two chunks of it.
    fn release_behind(&mut self) {
        if self.offset >= self.released + CHUNK_SIZE {
            let release = (self.offset - self.released) / CHUNK_SIZE * CHUNK_SIZE;
            // the cursor never moves back, so dropping these pages is safe;
            // failure only costs memory
            let _ = unsafe {
                self.map
                    .unchecked_advise_range(UncheckedAdvice::DontNeed, self.released, release)
            };
            self.released += release;
        }
    }
}

impl HistSource for ItchHistSource {
    fn next_time(&self) -> Timestamp {
        self.next_time
    }

    fn next_message(&self) -> &[u8] {
        &self.map[self.next_msg.clone()]
    }

    fn seek(&mut self, time: Timestamp) -> Timestamp {
        while self.next_time < time {
            self.advance();
        }
        self.next_time
    }

    fn advance(&mut self) -> Timestamp {
        if !self.next_msg.is_empty() {
            // 2 bytes of size header precede the payload
            self.offset += 2 + self.next_msg.len();
            self.release_behind();
        }

        let msg_start = self.offset + 2;
        if msg_start < self.total {
            let size = usize::from(be_u16(&self.map, self.offset));
            if size >= CommonHeader::SIZE && msg_start + size <= self.total {
                let header = CommonHeader::new(&self.map[msg_start..msg_start + size]);
                let time = self.midnight.saturating_add_nanos(header.timestamp_nanos());
                if time <= self.end_time {
                    self.next_time = time;
                    self.next_msg = msg_start..msg_start + size;
                    return time;
                }
                // reached end_time; suppress the framing error below
                self.offset = self.total;
            }
        }

        // file end, end_time, or malformed framing
        if self.offset != self.total {
            error!(
                "itch capture file is malformed or truncated, read {} of {} bytes",
                self.offset, self.total
            );
            self.offset = self.total;
        }
        self.next_time = Timestamp::MAX;
        self.next_msg = 0..0;
        self.next_time
    }
}
