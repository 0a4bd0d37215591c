pub mod mutual_fund;
pub mod nps;
pub mod util;

use crate::core::PriceHistoryProvider;
use crate::core::config::{CommodityType, ProvidersConfig};
use mutual_fund::MutualFundProvider;
use nps::NpsProvider;

/// One provider per commodity type, built from the configured endpoints.
pub struct PriceSources {
    mutual_fund: MutualFundProvider,
    nps: NpsProvider,
}

impl PriceSources {
    pub fn new(mutual_fund: MutualFundProvider, nps: NpsProvider) -> Self {
        Self { mutual_fund, nps }
    }

    pub fn from_config(config: &ProvidersConfig) -> Self {
        let defaults = ProvidersConfig::default();
        let mutual_fund_url = config
            .mutualfund
            .as_ref()
            .or(defaults.mutualfund.as_ref())
            .map_or("https://api.mfapi.in", |p| p.base_url.as_str());
        let nps_url = config
            .nps
            .as_ref()
            .or(defaults.nps.as_ref())
            .map_or("https://nps.purifiedbytes.com", |p| p.base_url.as_str());

        Self::new(
            MutualFundProvider::new(mutual_fund_url),
            NpsProvider::new(nps_url),
        )
    }

    pub fn for_type(&self, commodity_type: CommodityType) -> &dyn PriceHistoryProvider {
        match commodity_type {
            CommodityType::MutualFund => &self.mutual_fund,
            CommodityType::Nps => &self.nps,
        }
    }
}
