use economy::{Instrument, Trend};

/// Instruments seeded at startup. Existing rows are left untouched.
pub fn default_catalog() -> Vec<Instrument> {
    vec![
        Instrument::new("도이치모터스", 1000, Trend::Normal),
        Instrument::new("삼성전자", 70000, Trend::Normal),
        Instrument::new("산맥부대", 3000, Trend::Down),
        Instrument::new("법무법인 홀더", 150000, Trend::Up),
        Instrument::new("주식회사 김건희", 5000, Trend::Normal),
    ]
}
