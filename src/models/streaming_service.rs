use serde::Serialize;

/// A country the catalog can be filtered by
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct CountryOption {
    /// Lower-case ISO 3166-1 code (e.g., "us")
    pub code: &'static str,
    pub label: &'static str,
}

/// A streaming service and the countries it is offered in
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct StreamingServiceOption {
    /// Stable key used in vibe links (e.g., "netflix")
    pub key: &'static str,
    pub label: &'static str,
    /// TMDB watch-provider id
    pub provider_id: u32,
    pub countries: &'static [&'static str],
}

pub const DEFAULT_SERVICE_KEY: &str = "netflix";
pub const DEFAULT_COUNTRY: &str = "us";

pub const COUNTRIES: &[CountryOption] = &[
    CountryOption { code: "us", label: "United States" },
    CountryOption { code: "ca", label: "Canada" },
    CountryOption { code: "gb", label: "United Kingdom" },
    CountryOption { code: "fr", label: "France" },
    CountryOption { code: "de", label: "Germany" },
    CountryOption { code: "it", label: "Italy" },
    CountryOption { code: "es", label: "Spain" },
    CountryOption { code: "br", label: "Brazil" },
    CountryOption { code: "mx", label: "Mexico" },
    CountryOption { code: "au", label: "Australia" },
    CountryOption { code: "jp", label: "Japan" },
    CountryOption { code: "kr", label: "South Korea" },
    CountryOption { code: "in", label: "India" },
    CountryOption { code: "nl", label: "Netherlands" },
    CountryOption { code: "se", label: "Sweden" },
    CountryOption { code: "no", label: "Norway" },
    CountryOption { code: "dk", label: "Denmark" },
    CountryOption { code: "fi", label: "Finland" },
    CountryOption { code: "pt", label: "Portugal" },
    CountryOption { code: "pl", label: "Poland" },
    CountryOption { code: "za", label: "South Africa" },
    CountryOption { code: "sg", label: "Singapore" },
    CountryOption { code: "my", label: "Malaysia" },
    CountryOption { code: "ph", label: "Philippines" },
    CountryOption { code: "th", label: "Thailand" },
    CountryOption { code: "id", label: "Indonesia" },
    CountryOption { code: "ar", label: "Argentina" },
    CountryOption { code: "cl", label: "Chile" },
    CountryOption { code: "co", label: "Colombia" },
    CountryOption { code: "pe", label: "Peru" },
];

const ALL_COUNTRY_CODES: &[&str] = &[
    "us", "ca", "gb", "fr", "de", "it", "es", "br", "mx", "au", "jp", "kr", "in", "nl", "se",
    "no", "dk", "fi", "pt", "pl", "za", "sg", "my", "ph", "th", "id", "ar", "cl", "co", "pe",
];

pub const STREAMING_SERVICES: &[StreamingServiceOption] = &[
    StreamingServiceOption {
        key: "netflix",
        label: "Netflix",
        provider_id: 8,
        countries: ALL_COUNTRY_CODES,
    },
    StreamingServiceOption {
        key: "prime-video",
        label: "Prime Video",
        provider_id: 9,
        countries: ALL_COUNTRY_CODES,
    },
    StreamingServiceOption {
        key: "disney-plus",
        label: "Disney+",
        provider_id: 337,
        countries: &[
            "us", "ca", "gb", "fr", "de", "it", "es", "au", "jp", "kr", "in", "nl", "se", "no",
            "dk", "fi", "pt", "pl", "sg", "my", "ph", "th", "id", "ar", "cl", "co", "pe", "mx",
            "br", "za",
        ],
    },
    StreamingServiceOption {
        key: "hulu",
        label: "Hulu",
        provider_id: 15,
        countries: &["us"],
    },
    StreamingServiceOption {
        key: "max",
        label: "Max",
        provider_id: 189,
        countries: &["us", "mx", "br", "ar", "cl", "co", "pe"],
    },
    StreamingServiceOption {
        key: "apple-tv-plus",
        label: "Apple TV+",
        provider_id: 350,
        countries: ALL_COUNTRY_CODES,
    },
    StreamingServiceOption {
        key: "peacock",
        label: "Peacock",
        provider_id: 386,
        countries: &["us"],
    },
    StreamingServiceOption {
        key: "paramount-plus",
        label: "Paramount+",
        provider_id: 531,
        countries: &["us", "ca", "gb", "au", "br", "mx", "ar", "cl", "co", "pe"],
    },
];

impl StreamingServiceOption {
    /// Looks up a service by key, falling back to the default service
    pub fn by_key(key: &str) -> &'static StreamingServiceOption {
        STREAMING_SERVICES
            .iter()
            .find(|service| service.key == key)
            .unwrap_or(&STREAMING_SERVICES[0])
    }

    /// Checks if the service is offered in a country
    pub fn is_offered_in(&self, country: &str) -> bool {
        self.countries.contains(&country)
    }

    /// Countries this service is offered in, in catalog order
    pub fn country_options(&self) -> Vec<CountryOption> {
        COUNTRIES
            .iter()
            .filter(|country| self.is_offered_in(country.code))
            .copied()
            .collect()
    }

    /// Returns `country` if the service is offered there, otherwise the
    /// service's first catalog country
    pub fn valid_country(&self, country: Option<&str>) -> &'static str {
        if let Some(requested) = country {
            let requested = requested.trim().to_ascii_lowercase();
            if let Some(option) = COUNTRIES
                .iter()
                .find(|c| c.code == requested && self.is_offered_in(c.code))
            {
                return option.code;
            }
        }

        COUNTRIES
            .iter()
            .find(|c| self.is_offered_in(c.code))
            .map(|c| c.code)
            .unwrap_or(DEFAULT_COUNTRY)
    }
}
