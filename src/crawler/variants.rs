//! Variant tier: size options of a product page

use crate::adapter::{FieldRule, Interaction, VariantTier};
use crate::catalog::{IdSequence, Product, Variant};
use crate::config::OptionFailurePolicy;
use crate::crawler::coordinator::Walker;
use crate::crawler::extract::{Extraction, FieldSpec, SkipReason};
use crate::driver::Driver;
use crate::output::TierReport;
use tokio::time::Instant;

impl<D: Driver> Walker<'_, D> {
    /// Reads every option of one product into `variants`
    ///
    /// Navigation failures and a missing option control skip the product.
    /// A failing option becomes a placeholder or is dropped, per the
    /// option-failure policy.
    pub(super) async fn product_variants(
        &mut self,
        rules: &VariantTier,
        product: &Product,
        ids: &mut IdSequence,
        variants: &mut Vec<Variant>,
        report: &mut TierReport,
    ) {
        let Some(link) = &product.link else {
            tracing::warn!("Product {} has no link; skipping", product.id);
            report.record_skip("no-link");
            return;
        };

        tracing::debug!("Reading variants of product {} at {}", product.id, link);
        if let Err(e) = self.driver.navigate(link).await {
            tracing::warn!("Skipping product {}: {}", product.id, e);
            report.record_skip(e.kind());
            return;
        }

        let control = match self
            .driver
            .wait_for(
                &rules.control,
                self.settings.wait_timeout(),
                self.settings.poll_interval(),
            )
            .await
        {
            Ok(control) => control,
            Err(e) => {
                tracing::warn!(
                    "Option control '{}' missing for product {}: {}",
                    rules.control,
                    product.id,
                    e
                );
                self.write_snapshot(product).await;
                report.record_skip("no-control");
                return;
            }
        };

        let options = match self.driver.find_elements(Some(&control), &rules.option).await {
            Ok(options) => options,
            Err(e) => {
                tracing::warn!("Options unreadable for product {}: {}", product.id, e);
                report.record_skip(e.kind());
                return;
            }
        };
        if options.is_empty() {
            tracing::warn!("Product {} lists no options", product.id);
            report.record_skip("no-options");
            return;
        }

        for option in &options {
            match self.read_option(rules, &control, option).await {
                Extraction::Record(variant) => {
                    let padded = variant.padded;
                    let mut variant = variant.variant;
                    variant.id = ids.next_id();
                    variant.product_id = product.id;
                    if padded {
                        report.padded += 1;
                    }
                    variants.push(variant);
                }
                Extraction::Skipped(reason) => match self.settings.option_failure {
                    OptionFailurePolicy::Placeholder => {
                        tracing::warn!(
                            "Placeholder for option of product {}: {}",
                            product.id,
                            reason
                        );
                        report.placeholders += 1;
                        variants.push(Variant::placeholder(ids.next_id(), product.id));
                    }
                    OptionFailurePolicy::Skip => {
                        tracing::warn!(
                            "Skipping option of product {}: {}",
                            product.id,
                            reason
                        );
                        report.record_skip(&reason.kind);
                    }
                },
            }
        }
    }

    /// Chooses one option, waits for the price to settle and reads the fields
    async fn read_option(
        &mut self,
        rules: &VariantTier,
        control: &D::Element,
        option: &D::Element,
    ) -> Extraction<OptionRead> {
        let dynamic = self.driver.is_dynamic() && rules.price.selector.is_some();
        let before = if dynamic {
            self.fields.read(&*self.driver, None, &rules.price).await.ok()
        } else {
            None
        };

        let chosen = match rules.interaction {
            Interaction::Select => self.driver.select_option(control, option).await,
            Interaction::Click => self.driver.click(option).await,
        };
        if let Err(e) = chosen {
            return Extraction::Skipped(SkipReason::new("option", e.kind(), e.to_string()));
        }

        if dynamic {
            self.settle_price(rules, before).await;
        }

        let page_or_option = |rule: &FieldRule| {
            if rule.selector.is_some() {
                None
            } else {
                Some(option)
            }
        };

        let mut specs = vec![
            FieldSpec::new("size", &rules.size, Some(option)),
            FieldSpec::new("price", &rules.price, page_or_option(&rules.price)),
        ];
        if let Some(description) = &rules.description {
            specs.push(FieldSpec::new(
                "description",
                description,
                page_or_option(description),
            ));
        }

        let mut fields = match self.fields.read_record(&*self.driver, &specs).await {
            Extraction::Record(fields) => fields,
            Extraction::Skipped(reason) => return Extraction::Skipped(reason),
        };

        let icons = match &rules.icons {
            Some(rule) => self.fields.read_list(&*self.driver, rule).await,
            None => Vec::new(),
        };
        let colors = match &rules.colors {
            Some(rule) => self.fields.read_list(&*self.driver, rule).await,
            None => Vec::new(),
        };

        let padded = !fields.padded.is_empty();
        Extraction::Record(OptionRead {
            variant: Variant {
                id: 0,
                product_id: 0,
                size: fields.take("size"),
                price: fields.take("price"),
                description: fields.take("description"),
                icons,
                colors,
            },
            padded,
        })
    }

    /// Polls the price until it differs from `before`, bounded by the settle timeout
    async fn settle_price(&mut self, rules: &VariantTier, before: Option<String>) {
        let started = Instant::now();
        while started.elapsed() < self.settings.settle_timeout() {
            let now = self.fields.read(&*self.driver, None, &rules.price).await.ok();
            if now.is_some() && now != before {
                return;
            }
            tokio::time::sleep(self.settings.poll_interval()).await;
        }
        tracing::trace!("Price did not change within the settle timeout");
    }

    /// Saves the current page for a product whose option control is missing
    async fn write_snapshot(&self, product: &Product) {
        let Some(dir) = self.snapshot_dir else {
            return;
        };

        if let Err(e) = tokio::fs::create_dir_all(dir).await {
            tracing::warn!("Cannot create snapshot directory {}: {}", dir.display(), e);
            return;
        }

        let path = dir.join(format!("{}_product_{}.html", self.site.name, product.id));
        match self.driver.snapshot(&path).await {
            Ok(()) => tracing::info!("Saved page snapshot to {}", path.display()),
            Err(e) => tracing::warn!("Snapshot of product {} failed: {}", product.id, e),
        }
    }
}

/// Fields read for one option, before ids are assigned
#[derive(Debug, Clone, PartialEq, Eq)]
struct OptionRead {
    variant: Variant,
    padded: bool,
}
