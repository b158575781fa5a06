use crate::domain::ports::Storage;
use crate::utils::error::{QuoteError, Result};

pub const ONBOARDING_FLAG_FILE: &str = "hasCompletedOnboarding";

pub struct OnboardingSlide {
    pub title: &'static str,
    pub description: &'static str,
}

pub const SLIDES: [OnboardingSlide; 3] = [
    OnboardingSlide {
        title: "Book Transport in Seconds",
        description: "From parcels to premium rides, get started effortlessly.",
    },
    OnboardingSlide {
        title: "Track Every Booking",
        description: "Stay informed with real-time updates and booking status.",
    },
    OnboardingSlide {
        title: "We're With You Every Step",
        description: "Transparent communication and real-time booking updates.",
    },
];

/// First-run flag, read once at startup and written once on completion.
pub struct Onboarding<S: Storage> {
    storage: S,
    completed: bool,
}

impl<S: Storage> Onboarding<S> {
    /// A missing flag file means onboarding has not been completed.
    pub async fn load(storage: S) -> Result<Self> {
        let completed = match storage.read_file(ONBOARDING_FLAG_FILE).await {
            Ok(bytes) => String::from_utf8_lossy(&bytes).trim() == "true",
            Err(QuoteError::IoError(e)) if e.kind() == std::io::ErrorKind::NotFound => false,
            Err(e) => return Err(e),
        };
        tracing::debug!("Onboarding completed: {}", completed);
        Ok(Self { storage, completed })
    }

    pub fn should_show(&self) -> bool {
        !self.completed
    }

    pub async fn complete(&mut self) -> Result<()> {
        if self.completed {
            return Ok(());
        }
        self.storage.write_file(ONBOARDING_FLAG_FILE, b"true").await?;
        self.completed = true;
        tracing::info!("👋 Onboarding completed");
        Ok(())
    }
}
