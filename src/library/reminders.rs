use std::{
    collections::{HashMap, hash_map::Entry},
    sync::{Mutex, MutexGuard},
};

use rand::{Rng, seq::IndexedRandom};

use super::LibraryError;

const FIELDS: [&str; 7] = [
    "vk",
    "fb_group",
    "fb_page",
    "twitter",
    "app_download",
    "app_rate",
    "disabled_all",
];

fn enabled() -> bool {
    true
}

/// Reminder preferences of a user, stored as JSON next to the account.
#[derive(serde::Serialize, serde::Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Reminders {
    #[serde(default = "enabled")]
    pub vk: bool,
    #[serde(default = "enabled")]
    pub fb_group: bool,
    #[serde(default = "enabled")]
    pub fb_page: bool,
    #[serde(default = "enabled")]
    pub twitter: bool,
    #[serde(default = "enabled")]
    pub app_download: bool,
    #[serde(default = "enabled")]
    pub app_rate: bool,
    #[serde(default)]
    pub disabled_all: bool,
}

impl Default for Reminders {
    fn default() -> Self {
        Reminders {
            vk: true,
            fb_group: true,
            fb_page: true,
            twitter: true,
            app_download: true,
            app_rate: true,
            disabled_all: false,
        }
    }
}

#[derive(serde::Serialize, serde::Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct WebReminders {
    pub vk: bool,
    pub fb_group: bool,
    pub fb_page: bool,
    pub twitter: bool,
    pub app_download: bool,
    pub disabled_all: bool,
}

#[derive(serde::Serialize, serde::Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ApiReminders {
    pub vk: bool,
    pub fb_group: bool,
    pub fb_page: bool,
    pub twitter: bool,
    pub app_rate: bool,
    pub disabled_all: bool,
}

impl Reminders {
    pub fn web(&self) -> WebReminders {
        WebReminders {
            vk: self.vk,
            fb_group: self.fb_group,
            fb_page: self.fb_page,
            twitter: self.twitter,
            app_download: self.app_download,
            disabled_all: self.disabled_all,
        }
    }

    pub fn api(&self) -> ApiReminders {
        ApiReminders {
            vk: self.vk,
            fb_group: self.fb_group,
            fb_page: self.fb_page,
            twitter: self.twitter,
            app_rate: self.app_rate,
            disabled_all: self.disabled_all,
        }
    }

    /// Resolves a client-supplied flag name to its stored key.
    pub fn field(name: &str) -> Result<&'static str, LibraryError> {
        FIELDS
            .iter()
            .find(|field| **field == name)
            .copied()
            .ok_or_else(|| LibraryError::UnknownReminder(name.to_string()))
    }

    pub fn update(&mut self, field: &str, value: bool) -> Result<(), LibraryError> {
        let flag = match field {
            "vk" => &mut self.vk,
            "fb_group" => &mut self.fb_group,
            "fb_page" => &mut self.fb_page,
            "twitter" => &mut self.twitter,
            "app_download" => &mut self.app_download,
            "app_rate" => &mut self.app_rate,
            "disabled_all" => &mut self.disabled_all,
            other => return Err(LibraryError::UnknownReminder(other.to_string())),
        };
        *flag = value;

        Ok(())
    }

    /// Picks one of the enabled web reminders at random.
    pub fn select<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&'static str> {
        self.pick(
            [
                ("vk", self.vk),
                ("fb_group", self.fb_group),
                ("fb_page", self.fb_page),
                ("twitter", self.twitter),
                ("app_download", self.app_download),
            ],
            rng,
        )
    }

    /// Same as [`Reminders::select`] over the flags the mobile app knows.
    pub fn select_api<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&'static str> {
        self.pick(
            [
                ("vk", self.vk),
                ("fb_group", self.fb_group),
                ("fb_page", self.fb_page),
                ("twitter", self.twitter),
                ("app_rate", self.app_rate),
            ],
            rng,
        )
    }

    fn pick<R: Rng + ?Sized>(
        &self,
        flags: [(&'static str, bool); 5],
        rng: &mut R,
    ) -> Option<&'static str> {
        if self.disabled_all {
            return None;
        }

        let candidates: Vec<&'static str> = flags
            .into_iter()
            .filter_map(|(name, on)| on.then_some(name))
            .collect();

        candidates.choose(rng).copied()
    }
}

#[derive(Debug, Default)]
struct ReminderTicks {
    count: u32,
    pending: bool,
}

/// Counts authenticated requests per user. Once every `every` requests a
/// reminder becomes pending and stays so until the home page takes it.
#[derive(Debug)]
pub struct ReminderCounter {
    every: u32,
    counters: Mutex<HashMap<i64, ReminderTicks>>,
}

impl ReminderCounter {
    pub fn new(every: u32) -> Self {
        ReminderCounter {
            every,
            counters: Mutex::new(HashMap::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<i64, ReminderTicks>> {
        self.counters
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Registers one request of `user_id`; `true` when this request made a
    /// reminder pending.
    pub fn tick(&self, user_id: i64) -> bool {
        let mut counters = self.lock();

        let ticks = match counters.entry(user_id) {
            Entry::Occupied(entry) => {
                let ticks = entry.into_mut();
                ticks.count += 1;
                ticks
            }
            Entry::Vacant(entry) => entry.insert(ReminderTicks::default()),
        };

        if ticks.count >= self.every {
            ticks.count = 0;
            ticks.pending = true;
            return true;
        }

        false
    }

    /// Returns whether a reminder is pending for `user_id` and clears it.
    pub fn take_due(&self, user_id: i64) -> bool {
        self.lock()
            .get_mut(&user_id)
            .is_some_and(|ticks| std::mem::take(&mut ticks.pending))
    }
}
