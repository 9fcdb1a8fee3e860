//! Tuition pricing.
//!
//! Maps (invoice type, course level, course period) to a monthly amount. Only
//! monthly tuition (`MENSALIDADE`) is priced by the table; everything else is
//! [`Quote::Unlisted`] and the caller has to supply the amount.

use crate::entities::InvoiceType;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Academic level of a course.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[allow(missing_docs)]
pub enum CourseLevel {
    Licenciatura,
    Mestrado,
    TecnicoMedio,
    CurtaDuracao,
    Religioso,
}

/// Time slot a course is taught in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CoursePeriod {
    /// Daytime classes
    Laboral,
    /// Evening classes
    PosLaboral,
}

/// Result of looking up a price.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Quote {
    /// The table lists an amount for this combination
    Listed(f64),
    /// Not priced by the table; the caller must supply an amount
    Unlisted,
}

impl Quote {
    /// Legacy view of a quote: unlisted combinations read as zero.
    #[must_use]
    pub const fn amount_or_zero(self) -> f64 {
        match self {
            Self::Listed(amount) => amount,
            Self::Unlisted => 0.0,
        }
    }
}

/// Monthly tuition by course level and period.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct PricingTable {
    tuition: HashMap<CourseLevel, HashMap<CoursePeriod, f64>>,
}

impl Default for PricingTable {
    fn default() -> Self {
        let rows = [
            (CourseLevel::Licenciatura, 4500.0, 5200.0),
            (CourseLevel::Mestrado, 5500.0, 6200.0),
            (CourseLevel::TecnicoMedio, 3500.0, 4200.0),
            (CourseLevel::CurtaDuracao, 2500.0, 3200.0),
            (CourseLevel::Religioso, 1500.0, 2200.0),
        ];

        let tuition = rows
            .into_iter()
            .map(|(level, laboral, pos_laboral)| {
                (
                    level,
                    HashMap::from([
                        (CoursePeriod::Laboral, laboral),
                        (CoursePeriod::PosLaboral, pos_laboral),
                    ]),
                )
            })
            .collect();

        Self { tuition }
    }
}

impl PricingTable {
    /// Builds a table from explicit tuition rows.
    #[must_use]
    pub const fn new(tuition: HashMap<CourseLevel, HashMap<CoursePeriod, f64>>) -> Self {
        Self { tuition }
    }

    /// Looks up the monthly amount for an invoice type on a course.
    #[must_use]
    pub fn quote(&self, invoice_type: InvoiceType, level: CourseLevel, period: CoursePeriod) -> Quote {
        if invoice_type != InvoiceType::Mensalidade {
            return Quote::Unlisted;
        }

        self.tuition
            .get(&level)
            .and_then(|periods| periods.get(&period))
            .map_or(Quote::Unlisted, |amount| Quote::Listed(*amount))
    }

    /// Same lookup as [`PricingTable::quote`], flattening unlisted combinations to zero.
    #[must_use]
    pub fn amount(&self, invoice_type: InvoiceType, level: CourseLevel, period: CoursePeriod) -> f64 {
        self.quote(invoice_type, level, period).amount_or_zero()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;

    #[test]
    fn test_tuition_lookup() {
        let table = PricingTable::default();
        assert_eq!(
            table.amount(
                InvoiceType::Mensalidade,
                CourseLevel::Licenciatura,
                CoursePeriod::Laboral
            ),
            4500.0
        );
        assert_eq!(
            table.amount(
                InvoiceType::Mensalidade,
                CourseLevel::Licenciatura,
                CoursePeriod::PosLaboral
            ),
            5200.0
        );
        assert_eq!(
            table.quote(
                InvoiceType::Mensalidade,
                CourseLevel::Religioso,
                CoursePeriod::PosLaboral
            ),
            Quote::Listed(2200.0)
        );
    }

    #[test]
    fn test_non_tuition_types_are_unlisted() {
        let table = PricingTable::default();
        for invoice_type in [
            InvoiceType::Matricula,
            InvoiceType::Propina,
            InvoiceType::Material,
            InvoiceType::Outros,
        ] {
            assert_eq!(
                table.quote(invoice_type, CourseLevel::Mestrado, CoursePeriod::Laboral),
                Quote::Unlisted
            );
            assert_eq!(
                table.amount(invoice_type, CourseLevel::Mestrado, CoursePeriod::Laboral),
                0.0
            );
        }
    }

    #[test]
    fn test_missing_level_is_unlisted() {
        let table = PricingTable::new(HashMap::from([(
            CourseLevel::Mestrado,
            HashMap::from([(CoursePeriod::Laboral, 5000.0)]),
        )]));

        assert_eq!(
            table.quote(
                InvoiceType::Mensalidade,
                CourseLevel::Licenciatura,
                CoursePeriod::Laboral
            ),
            Quote::Unlisted
        );
        assert_eq!(
            table.quote(
                InvoiceType::Mensalidade,
                CourseLevel::Mestrado,
                CoursePeriod::PosLaboral
            ),
            Quote::Unlisted
        );
        assert_eq!(
            table.amount(
                InvoiceType::Mensalidade,
                CourseLevel::Mestrado,
                CoursePeriod::Laboral
            ),
            5000.0
        );
    }

    #[test]
    fn test_table_parses_from_toml() {
        #[derive(Deserialize)]
        struct Wrapper {
            pricing: PricingTable,
        }

        let wrapper: Wrapper = toml::from_str(
            r"
            [pricing.LICENCIATURA]
            LABORAL = 4800.0
            POS_LABORAL = 5600.0
            ",
        )
        .unwrap();

        assert_eq!(
            wrapper.pricing.quote(
                InvoiceType::Mensalidade,
                CourseLevel::Licenciatura,
                CoursePeriod::PosLaboral
            ),
            Quote::Listed(5600.0)
        );
        assert_eq!(
            wrapper.pricing.quote(
                InvoiceType::Mensalidade,
                CourseLevel::Mestrado,
                CoursePeriod::Laboral
            ),
            Quote::Unlisted
        );
    }
}
