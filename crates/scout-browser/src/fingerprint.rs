use rand::Rng;

/// Fingerprint configuration for anti-detection
#[derive(Debug, Clone)]
pub struct FingerprintConfig {
    pub user_agent: String,
    pub viewport_width: u32,
    pub viewport_height: u32,
    pub locale: String,
    pub timezone: String,
}

impl FingerprintConfig {
    /// Generate a randomized Windows desktop fingerprint.
    ///
    /// The viewport never exceeds `max_width` x `max_height`.
    pub fn randomized(locale: &str, max_width: u32, max_height: u32) -> Self {
        let mut rng = rand::thread_rng();

        let user_agents = [
            "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
            "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/125.0.0.0 Safari/537.36",
            "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0.0.0 Safari/537.36 Edg/126.0.0.0",
        ];

        let viewports = [(1920, 1080), (1680, 1050), (1536, 864), (1440, 900), (1366, 768)];
        let fitting: Vec<(u32, u32)> = viewports
            .iter()
            .copied()
            .filter(|(w, h)| *w <= max_width && *h <= max_height)
            .collect();

        let (width, height) = if fitting.is_empty() {
            (max_width, max_height)
        } else {
            fitting[rng.gen_range(0..fitting.len())]
        };

        Self {
            user_agent: user_agents[rng.gen_range(0..user_agents.len())].to_string(),
            viewport_width: width,
            viewport_height: height,
            locale: locale.to_string(),
            timezone: "Asia/Shanghai".to_string(),
        }
    }

    /// `Accept-Language` value derived from the locale.
    pub fn accept_language(&self) -> String {
        match self.locale.split_once('-') {
            Some((lang, _)) => format!("{},{};q=0.9", self.locale, lang),
            None => self.locale.clone(),
        }
    }
}
