//! Launch flags and in-page evasions that hide WebDriver control.
use super::fingerprint::UserAgentProfile;
use harvest_common::StealthLevel;

/// How much of the automation fingerprint to mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StealthProfile {
    /// Launch flags and the `navigator.webdriver` patch only.
    Lightweight,
    /// Adds canvas noise.
    Balanced,
    /// Adds WebGL vendor spoofing and a matching `navigator.platform`.
    Maximum,
}

impl From<StealthLevel> for StealthProfile {
    fn from(level: StealthLevel) -> Self {
        match level {
            StealthLevel::Lightweight => Self::Lightweight,
            StealthLevel::Balanced => Self::Balanced,
            StealthLevel::Maximum => Self::Maximum,
        }
    }
}

const NAVIGATOR_EVASION: &str = r#"
(() => {
  Object.defineProperty(navigator, 'webdriver', { get: () => undefined });
  if (navigator.plugins.length === 0) {
    Object.defineProperty(navigator, 'plugins', { get: () => [1, 2, 3] });
  }
  window.chrome = window.chrome || { runtime: {} };
})();
"#;

const CANVAS_EVASION: &str = r#"
(() => {
  const toDataURL = HTMLCanvasElement.prototype.toDataURL;
  HTMLCanvasElement.prototype.toDataURL = function (...args) {
    const ctx = this.getContext('2d');
    if (ctx && this.width && this.height) {
      const px = ctx.getImageData(0, 0, 1, 1);
      px.data[0] = px.data[0] ^ 1;
      ctx.putImageData(px, 0, 0);
    }
    return toDataURL.apply(this, args);
  };
})();
"#;

const WEBGL_EVASION: &str = r#"
(() => {
  const getParameter = WebGLRenderingContext.prototype.getParameter;
  WebGLRenderingContext.prototype.getParameter = function (p) {
    if (p === 37445) return 'Intel Inc.';
    if (p === 37446) return 'Intel Iris OpenGL Engine';
    return getParameter.call(this, p);
  };
})();
"#;

/// Chrome command-line flags for `profile` presenting as `ua`.
pub fn chrome_arguments(profile: StealthProfile, ua: &UserAgentProfile, headless: bool) -> Vec<String> {
    let mut args: Vec<String> = [
        "--disable-blink-features=AutomationControlled",
        "--disable-infobars",
        "--disable-dev-shm-usage",
        "--no-sandbox",
        "--disable-extensions",
    ]
    .into_iter()
    .map(String::from)
    .collect();

    args.push(format!("--user-agent={}", ua.user_agent));
    args.push(format!("--window-size={},{}", ua.viewport.0, ua.viewport.1));
    args.push(format!("--lang={}", ua.languages.join(",")));

    if headless {
        args.push("--headless=new".into());
    }
    if headless || profile == StealthProfile::Maximum {
        args.push("--disable-gpu".into());
    }
    args
}

/// Scripts to run after each navigation, in order.
pub fn evasion_scripts(profile: StealthProfile, ua: &UserAgentProfile) -> Vec<String> {
    let mut scripts = vec![NAVIGATOR_EVASION.to_string()];
    if profile != StealthProfile::Lightweight {
        scripts.push(CANVAS_EVASION.to_string());
    }
    if profile == StealthProfile::Maximum {
        scripts.push(WEBGL_EVASION.to_string());
        scripts.push(format!(
            "Object.defineProperty(navigator, 'platform', {{ get: () => '{}' }});",
            ua.platform
        ));
    }
    scripts
}
