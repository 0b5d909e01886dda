use std::sync::Arc;

use clap::Args;

use rcfinder_core::{
    AgeGroup, AppConfig, Coordinate, Diagnosis, Insurance, Region, SearchFilters, SortOption,
    COUNTY_CENTROID, DEFAULT_RADIUS_MILES,
};
use rcfinder_geo::{format_distance, LocationQuery, RegionResolver};
use rcfinder_search::{CoordinatorConfig, ProviderApiClient, SearchCoordinator};

#[derive(Debug, Args)]
pub(crate) struct SearchArgs {
    #[arg(long, allow_negative_numbers = true)]
    pub lat: Option<f64>,
    #[arg(long, allow_negative_numbers = true)]
    pub lng: Option<f64>,
    /// Free-text query; a bare 5-digit ZIP searches that ZIP.
    #[arg(long)]
    pub q: Option<String>,
    #[arg(long, value_parser = parse_age_group)]
    pub age_group: Option<AgeGroup>,
    #[arg(long, value_parser = parse_diagnosis)]
    pub diagnosis: Option<Diagnosis>,
    #[arg(long, value_parser = parse_insurance)]
    pub insurance: Option<Insurance>,
    /// May be given multiple times.
    #[arg(long = "therapy")]
    pub therapy: Vec<String>,
    /// Search radius in miles.
    #[arg(long)]
    pub radius: Option<f64>,
    #[arg(long, value_parser = parse_sort, default_value = "distance")]
    pub sort: SortOption,
}

/// Print the regional center catalog as a table.
///
/// # Errors
///
/// Infallible; returns `Result` for uniformity with the other commands.
pub(crate) fn run_regions(resolver: &RegionResolver) -> anyhow::Result<()> {
    let header = format!("{:<9}{:<16}{:<7}NAME", "ACRONYM", "PHONE", "ZIPS");
    println!("{header}");
    for region in resolver.regions() {
        let zip_count = resolver
            .zip_table()
            .entries()
            .filter(|(_, acronym)| *acronym == region.acronym)
            .count();
        println!(
            "{:<9}{:<16}{:<7}{}",
            region.acronym, region.contact.phone, zip_count, region.name
        );
    }
    Ok(())
}

/// Resolve a location to its regional center and print the details.
///
/// # Errors
///
/// Returns an error when neither input is given, when lat/lng are not
/// provided together, or when the inputs fail validation.
pub(crate) fn run_resolve(
    resolver: &RegionResolver,
    lat: Option<f64>,
    lng: Option<f64>,
    zip: Option<String>,
) -> anyhow::Result<()> {
    let coordinate = match (lat, lng) {
        (Some(lat), Some(lng)) => Some(Coordinate::new(lat, lng)),
        (None, None) => None,
        _ => anyhow::bail!("--lat and --lng must be provided together"),
    };
    let query = LocationQuery { coordinate, zip };

    match resolver.resolve(&query)? {
        Some(region) => print_region(region),
        None => println!("no regional center covers this location"),
    }
    Ok(())
}

/// Run one provider search (no debounce) and print ranked results.
///
/// # Errors
///
/// Returns an error when the upstream client cannot be built or the search
/// fails after retries.
pub(crate) async fn run_search(
    config: &AppConfig,
    resolver: Arc<RegionResolver>,
    args: SearchArgs,
) -> anyhow::Result<()> {
    let (location, fallback) = match (args.lat, args.lng) {
        (Some(lat), Some(lng)) => (Coordinate::new(lat, lng), false),
        (None, None) => (COUNTY_CENTROID, true),
        _ => anyhow::bail!("--lat and --lng must be provided together"),
    };
    if fallback {
        println!("no location given; results are anchored at the county center\n");
    }

    let client = ProviderApiClient::new(
        &config.provider_api_url,
        config.http_request_timeout_secs,
        &config.http_user_agent,
        config.http_max_retries,
        config.http_retry_backoff_base_secs,
    )?;
    let coordinator = SearchCoordinator::new(
        client,
        resolver,
        CoordinatorConfig::from_app_config(config),
    );

    let filters = SearchFilters {
        age_group: args.age_group,
        diagnosis: args.diagnosis,
        insurance: args.insurance,
        therapy_types: args.therapy,
        radius_miles: args.radius.unwrap_or(DEFAULT_RADIUS_MILES),
        free_text: args.q,
    };
    let result = coordinator.search_now(&filters, location, args.sort).await?;

    if let Some(region) = &result.region {
        println!("Regional center: {} ({})", region.name, region.acronym);
        println!("Contact: {} \u{2014} {}", region.contact.phone, region.contact.website);
        println!();
    }

    if result.providers.is_empty() {
        println!("no providers found; try a wider radius or fewer filters");
        return Ok(());
    }

    let header = format!("{:<10}{:<14}{:<16}NAME", "DISTANCE", "TYPE", "PHONE");
    println!("{header}");
    for ranked in &result.providers {
        let distance = match ranked.distance_miles {
            Some(miles) => format_distance(miles),
            None => "\u{2014}".to_string(),
        };
        let kind = truncate(&ranked.provider.provider_type, 12);
        let phone = ranked.provider.phone.as_deref().unwrap_or("\u{2014}");
        println!(
            "{:<10}{:<14}{:<16}{}",
            distance, kind, phone, ranked.provider.name
        );
    }
    Ok(())
}

fn print_region(region: &Region) {
    println!("{} ({})", region.name, region.acronym);
    println!("Phone:   {}", region.contact.phone);
    println!("Website: {}", region.contact.website);
    println!("Office:  {:.4}, {:.4}", region.center.lat, region.center.lng);
    if let Some(desc) = &region.catchment_desc {
        println!("Serves:  {desc}");
    }
}

fn truncate(value: &str, max: usize) -> String {
    if value.chars().count() > max {
        format!("{}...", value.chars().take(max).collect::<String>())
    } else {
        value.to_string()
    }
}

pub(crate) fn parse_age_group(raw: &str) -> Result<AgeGroup, String> {
    match raw {
        "early_intervention" => Ok(AgeGroup::EarlyIntervention),
        "school_age" => Ok(AgeGroup::SchoolAge),
        "transition" => Ok(AgeGroup::Transition),
        "adult" => Ok(AgeGroup::Adult),
        _ => Err(format!(
            "unknown age group '{raw}' (expected early_intervention, school_age, transition, or adult)"
        )),
    }
}

pub(crate) fn parse_diagnosis(raw: &str) -> Result<Diagnosis, String> {
    match raw {
        "autism" => Ok(Diagnosis::Autism),
        "cerebral_palsy" => Ok(Diagnosis::CerebralPalsy),
        "epilepsy" => Ok(Diagnosis::Epilepsy),
        "intellectual_disability" => Ok(Diagnosis::IntellectualDisability),
        "other" => Ok(Diagnosis::Other),
        _ => Err(format!("unknown diagnosis '{raw}'")),
    }
}

pub(crate) fn parse_insurance(raw: &str) -> Result<Insurance, String> {
    match raw {
        "medi_cal" => Ok(Insurance::MediCal),
        "private" => Ok(Insurance::Private),
        "regional_center_funded" => Ok(Insurance::RegionalCenterFunded),
        _ => Err(format!(
            "unknown insurance '{raw}' (expected medi_cal, private, or regional_center_funded)"
        )),
    }
}

pub(crate) fn parse_sort(raw: &str) -> Result<SortOption, String> {
    match raw {
        "distance" => Ok(SortOption::Distance),
        "name" => Ok(SortOption::Name),
        "type" => Ok(SortOption::Type),
        _ => Err(format!(
            "unknown sort '{raw}' (expected distance, name, or type)"
        )),
    }
}
