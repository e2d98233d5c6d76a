use std::fmt::Display;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProductError {
    #[error("Unknown product '{0}'")]
    UnknownProduct(String),
}

/// The products quoted in the daily comparative report, in report order.
///
/// The report lays them out as 7 sections of 4 products each; the position of a
/// product in [`Product::ALL`] is its section index times 4 plus its block index.
/// Names double as worksheet and table names in the summary workbook.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Product {
    SrwUsGulf,
    HrwTexasGulf,
    HrwUsPnw,
    WhiteWheatUsPnw,
    DnsUsPnw,
    No1MillingDns,
    ArgentineWheat,
    FrenchWheat,
    RussianMillingWheat,
    UkrainianMillingWheat,
    RussianCorn,
    UkrainianCorn,
    GulfCorn,
    PnwCorn,
    ArgentineCorn,
    BrazilianCorn,
    GulfSoybeans,
    ArgentineSoybeans,
    BrazilianSoybeans,
    CanadianCanola,
    GulfSoyoil,
    ArgentineSoyoil,
    BrazilianSoyoil,
    MalaysianOlein,
    GulfSoymeal,
    ArgentineSoymealPellets,
    BrazilianSoymealPellets,
    IndianSoymeal,
}

impl Product {
    /// Products per report section
    pub const PER_SECTION: usize = 4;

    pub const ALL: [Product; 28] = [
        Product::SrwUsGulf,
        Product::HrwTexasGulf,
        Product::HrwUsPnw,
        Product::WhiteWheatUsPnw,
        Product::DnsUsPnw,
        Product::No1MillingDns,
        Product::ArgentineWheat,
        Product::FrenchWheat,
        Product::RussianMillingWheat,
        Product::UkrainianMillingWheat,
        Product::RussianCorn,
        Product::UkrainianCorn,
        Product::GulfCorn,
        Product::PnwCorn,
        Product::ArgentineCorn,
        Product::BrazilianCorn,
        Product::GulfSoybeans,
        Product::ArgentineSoybeans,
        Product::BrazilianSoybeans,
        Product::CanadianCanola,
        Product::GulfSoyoil,
        Product::ArgentineSoyoil,
        Product::BrazilianSoyoil,
        Product::MalaysianOlein,
        Product::GulfSoymeal,
        Product::ArgentineSoymealPellets,
        Product::BrazilianSoymealPellets,
        Product::IndianSoymeal,
    ];

    /// Sheet and table name of the product.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Product::SrwUsGulf => "SRW_US_Gulf",
            Product::HrwTexasGulf => "HRW_Texas_Gulf",
            Product::HrwUsPnw => "HRW_US_PNW",
            Product::WhiteWheatUsPnw => "White_Wheat_US_PNW",
            Product::DnsUsPnw => "DNS_US_PNW",
            Product::No1MillingDns => "No1_Milling_DNS",
            Product::ArgentineWheat => "Argentine_Wheat",
            Product::FrenchWheat => "French_Wheat",
            Product::RussianMillingWheat => "Russian_Milling_Wheat",
            Product::UkrainianMillingWheat => "Ukrainian_Milling_Wheat",
            Product::RussianCorn => "Russian_Corn",
            Product::UkrainianCorn => "Ukrainian_Corn",
            Product::GulfCorn => "Gulf_Corn",
            Product::PnwCorn => "PNW_Corn",
            Product::ArgentineCorn => "Argentine_Corn",
            Product::BrazilianCorn => "Brazilian_Corn",
            Product::GulfSoybeans => "Gulf_Soybeans",
            Product::ArgentineSoybeans => "Argentine_Soybeans",
            Product::BrazilianSoybeans => "Brazilian_Soybeans",
            Product::CanadianCanola => "Canadian_Canola",
            Product::GulfSoyoil => "Gulf_Soyoil",
            Product::ArgentineSoyoil => "Argentine_Soyoil",
            Product::BrazilianSoyoil => "Brazilian_Soyoil",
            Product::MalaysianOlein => "Malaysian_Olein",
            Product::GulfSoymeal => "Gulf_Soymeal",
            Product::ArgentineSoymealPellets => "Argentine_Soymeal_Pellets",
            Product::BrazilianSoymealPellets => "Brazilian_Soymeal_Pellets",
            Product::IndianSoymeal => "Indian_Soymeal",
        }
    }

    /// Parses a product from its sheet name, ignoring ASCII case.
    pub fn parse(name: &str) -> Result<Self, ProductError> {
        let name = name.trim();
        Self::ALL
            .into_iter()
            .find(|product| product.as_str().eq_ignore_ascii_case(name))
            .ok_or_else(|| ProductError::UnknownProduct(name.to_owned()))
    }

    /// Product at a position of the report layout, if within the catalogue.
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Position of the product in the report layout.
    pub fn index(&self) -> usize {
        *self as usize
    }
}

impl Display for Product {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
