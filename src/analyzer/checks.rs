//! The fixed check battery. Ids, weights, and fix texts are part of the
//! public rubric (version 1.0) and must not change without a version bump.

use crate::analyzer::model::{CategoryId, CheckDef};

pub const ACCESS_FETCH: CheckDef = CheckDef {
    id: "access-fetch",
    name: "Page fetchability",
    category: CategoryId::Access,
    max: 10,
    fix: "Ensure a normal browser-style GET request can fetch the page without blocking.",
};

pub const ACCESS_STATUS: CheckDef = CheckDef {
    id: "access-status",
    name: "HTTP status",
    category: CategoryId::Access,
    max: 8,
    fix: "Return a stable 200 response for the canonical page URL.",
};

pub const ACCESS_REDIRECTS: CheckDef = CheckDef {
    id: "access-redirects",
    name: "Redirect/canonical sanity",
    category: CategoryId::Access,
    max: 7,
    fix: "Reduce unnecessary redirect chains and keep canonical URL consistent.",
};

pub const ACCESS_ROBOTS_TXT: CheckDef = CheckDef {
    id: "access-robots-txt",
    name: "robots.txt availability",
    category: CategoryId::Access,
    max: 5,
    fix: "Publish a readable robots.txt at /robots.txt with crawl directives and sitemap reference.",
};

pub const ACCESS_SITEMAP_XML: CheckDef = CheckDef {
    id: "access-sitemap-xml",
    name: "sitemap.xml availability",
    category: CategoryId::Access,
    max: 5,
    fix: "Publish a valid sitemap.xml (urlset or sitemapindex) and keep it updated.",
};

pub const META_TITLE: CheckDef = CheckDef {
    id: "meta-title",
    name: "Title tag quality",
    category: CategoryId::Metadata,
    max: 7,
    fix: "Use a specific title that reflects the page topic and audience intent.",
};

pub const META_DESCRIPTION: CheckDef = CheckDef {
    id: "meta-description",
    name: "Meta description quality",
    category: CategoryId::Metadata,
    max: 6,
    fix: "Write a clear 70-160 char description summarizing value and context.",
};

pub const META_ROBOTS: CheckDef = CheckDef {
    id: "meta-robots",
    name: "Indexing directives",
    category: CategoryId::Metadata,
    max: 6,
    fix: "Avoid noindex/noarchive directives on pages intended for discovery.",
};

pub const META_CANONICAL: CheckDef = CheckDef {
    id: "meta-canonical",
    name: "Canonical URL tag",
    category: CategoryId::Metadata,
    max: 6,
    fix: "Add a canonical link and keep it aligned with your preferred URL.",
};

pub const CONTENT_H1: CheckDef = CheckDef {
    id: "content-h1",
    name: "H1 structure",
    category: CategoryId::Content,
    max: 8,
    fix: "Use one clear H1 that matches the page purpose.",
};

pub const CONTENT_HEADINGS: CheckDef = CheckDef {
    id: "content-headings",
    name: "Heading hierarchy",
    category: CategoryId::Content,
    max: 5,
    fix: "Use H2/H3 sections to make content scannable for users and crawlers.",
};

pub const CONTENT_DEPTH: CheckDef = CheckDef {
    id: "content-depth",
    name: "Meaningful body content",
    category: CategoryId::Content,
    max: 8,
    fix: "Add clear descriptive content about services, audience, outcomes, and location context.",
};

pub const CONTENT_TRUST: CheckDef = CheckDef {
    id: "content-trust-signals",
    name: "Contact/about trust signals",
    category: CategoryId::Content,
    max: 4,
    fix: "Include obvious About and Contact paths in internal links or body text.",
};

pub const SD_PRESENCE: CheckDef = CheckDef {
    id: "sd-presence",
    name: "JSON-LD presence",
    category: CategoryId::StructuredData,
    max: 10,
    fix: "Add at least one JSON-LD block describing your organization or page entity.",
};

pub const SD_VALIDITY: CheckDef = CheckDef {
    id: "sd-validity",
    name: "JSON-LD validity",
    category: CategoryId::StructuredData,
    max: 10,
    fix: "Fix JSON-LD syntax errors and validate scripts with structured data tools.",
};

pub const SD_RECOMMENDED_TYPES: CheckDef = CheckDef {
    id: "sd-recommended-types",
    name: "Recommended schema types",
    category: CategoryId::StructuredData,
    max: 5,
    fix: "Prefer Organization/WebSite or LocalBusiness types where appropriate.",
};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::model::CategoryId;

    const ALL: [&CheckDef; 16] = [
        &ACCESS_FETCH,
        &ACCESS_STATUS,
        &ACCESS_REDIRECTS,
        &ACCESS_ROBOTS_TXT,
        &ACCESS_SITEMAP_XML,
        &META_TITLE,
        &META_DESCRIPTION,
        &META_ROBOTS,
        &META_CANONICAL,
        &CONTENT_H1,
        &CONTENT_HEADINGS,
        &CONTENT_DEPTH,
        &CONTENT_TRUST,
        &SD_PRESENCE,
        &SD_VALIDITY,
        &SD_RECOMMENDED_TYPES,
    ];

    #[test]
    fn every_category_tops_out_at_twenty_five() {
        for category in CategoryId::ALL {
            let total: u32 = ALL
                .iter()
                .filter(|def| def.category == category)
                .map(|def| def.max)
                .sum();
            assert_eq!(total, 25, "{category}");
        }
    }

    #[test]
    fn check_ids_are_unique() {
        let mut ids: Vec<&str> = ALL.iter().map(|def| def.id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), ALL.len());
    }
}
