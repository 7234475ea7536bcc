//! Desktop identities a browser session can present.
use rand::seq::SliceRandom;

/// User agent, window size and locale reported by one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserAgentProfile {
    pub user_agent: &'static str,
    pub viewport: (u32, u32),
    /// Value reported as `navigator.platform`.
    pub platform: &'static str,
    pub languages: &'static [&'static str],
}

pub const DESKTOP_PROFILES: &[UserAgentProfile] = &[
    UserAgentProfile {
        user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
        viewport: (1920, 1080),
        platform: "Win32",
        languages: &["en-US", "en"],
    },
    UserAgentProfile {
        user_agent: "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
        viewport: (1440, 900),
        platform: "MacIntel",
        languages: &["en-US", "en"],
    },
    UserAgentProfile {
        user_agent: "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/130.0.0.0 Safari/537.36",
        viewport: (1600, 900),
        platform: "Linux x86_64",
        languages: &["en-GB", "en"],
    },
];

/// Random identity for a new session.
pub fn session_profile() -> UserAgentProfile {
    DESKTOP_PROFILES
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(DESKTOP_PROFILES[0])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_profile_comes_from_pool() {
        for _ in 0..20 {
            assert!(DESKTOP_PROFILES.contains(&session_profile()));
        }
    }

    #[test]
    fn profiles_are_chrome_desktop() {
        for p in DESKTOP_PROFILES {
            assert!(p.user_agent.contains("Chrome/"));
            assert!(!p.languages.is_empty());
        }
    }
}
