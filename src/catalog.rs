//! # Catalog Store Module
//!
//! ## Purpose
//! The authoritative list of colleges. A built-in seed dataset gets stable
//! `college_<n>` ids assigned once at load; an admin overlay supports
//! create/update/delete; an optional database tier persists the catalog and
//! is merged with the seed data on reads so newly added seed entries stay
//! visible even when the database holds an older migration.

use crate::errors::Result;
use crate::filters::{self, CollegeFilter};
use crate::storage::Tree;
use crate::utils::IdUtils;
use crate::{College, CollegeType};
use dashmap::DashMap;

/// Where a catalog listing was served from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogSource {
    Static,
    DatabaseMerged,
}

impl CatalogSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            CatalogSource::Static => "static",
            CatalogSource::DatabaseMerged => "database+static",
        }
    }
}

/// Catalog store: seed dataset + admin overlay + optional database tier.
pub struct CatalogStore {
    seed: Vec<College>,
    overlay: DashMap<String, College>,
    tree: Option<Tree>,
}

impl CatalogStore {
    pub fn new(tree: Option<Tree>) -> Self {
        let seed = seed_catalog();
        let overlay = DashMap::new();
        for college in &seed {
            overlay.insert(college.id.clone(), college.clone());
        }
        Self { seed, overlay, tree }
    }

    /// The full seed catalog, in load order.
    pub fn all(&self) -> Vec<College> {
        self.seed.clone()
    }

    /// Filtered listing. When a database is configured and its filtered
    /// result set is non-empty, it is merged with the filtered seed list
    /// (deduplicated on lowercased `id::name`) and sorted by ranking.
    pub fn list(&self, filter: &CollegeFilter) -> (Vec<College>, CatalogSource) {
        let static_filtered = filters::filter_colleges(&self.seed, filter);

        if let Some(tree) = &self.tree {
            match tree.all::<College>() {
                Ok(db_colleges) if !db_colleges.is_empty() => {
                    let db_filtered = filters::filter_colleges(&db_colleges, filter);
                    if !db_filtered.is_empty() {
                        let merged = merge_by_identity(db_filtered, static_filtered);
                        return (merged, CatalogSource::DatabaseMerged);
                    }
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!("Catalog database read failed, falling back to seed data: {}", e);
                }
            }
        }

        (static_filtered, CatalogSource::Static)
    }

    /// Resolve a single college by id: database first, then the seed
    /// dataset via `college_<n>`, then the admin overlay.
    pub fn lookup(&self, id: &str) -> Option<College> {
        if let Some(tree) = &self.tree {
            match tree.get::<College>(id) {
                Ok(Some(college)) => return Some(college),
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!("Catalog database lookup failed, falling back to seed data: {}", e);
                }
            }
        }

        if let Some(index) = IdUtils::parse_index_id("college", id) {
            if let Some(college) = self.seed.get(index) {
                return Some(college.clone());
            }
            return None;
        }

        self.overlay.get(id).map(|entry| entry.value().clone())
    }

    /// Admin listing: every known college sorted by ranking ascending.
    pub fn admin_list(&self) -> Vec<College> {
        if let Some(tree) = &self.tree {
            match tree.all::<College>() {
                Ok(mut colleges) if !colleges.is_empty() => {
                    colleges.sort_by_key(|c| rank_or_max(c));
                    return colleges;
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!("Admin catalog read failed, falling back to overlay: {}", e);
                }
            }
        }

        let mut colleges: Vec<College> = self.overlay.iter().map(|e| e.value().clone()).collect();
        colleges.sort_by_key(rank_or_max);
        colleges
    }

    /// Create an admin-managed college with a custom id.
    pub fn admin_create(&self, mut college: College) -> College {
        college.id = format!("college_custom_{}", chrono::Utc::now().timestamp_millis());
        self.overlay.insert(college.id.clone(), college.clone());
        if let Some(tree) = &self.tree {
            if let Err(e) = tree.put(&college.id, &college) {
                tracing::warn!("Catalog database create failed, kept in memory only: {}", e);
            }
        }
        college
    }

    /// Update an existing college in place. Returns the updated record, or
    /// None when the id is unknown.
    pub fn admin_update(&self, id: &str, mut college: College) -> Option<College> {
        if !self.overlay.contains_key(id) {
            return None;
        }
        college.id = id.to_string();
        self.overlay.insert(id.to_string(), college.clone());
        if let Some(tree) = &self.tree {
            if let Err(e) = tree.put(id, &college) {
                tracing::warn!("Catalog database update failed, kept in memory only: {}", e);
            }
        }
        Some(college)
    }

    /// Delete a college by id. Returns whether anything was removed.
    pub fn admin_delete(&self, id: &str) -> bool {
        let removed = self.overlay.remove(id).is_some();
        if let Some(tree) = &self.tree {
            match tree.remove(id) {
                Ok(db_removed) => return removed || db_removed,
                Err(e) => tracing::warn!("Catalog database delete failed: {}", e),
            }
        }
        removed
    }

    /// Seed the database tier with the built-in catalog. Skipped when the
    /// colleges tree already holds records.
    pub fn seed_database(&self) -> Result<usize> {
        let Some(tree) = &self.tree else {
            return Ok(0);
        };

        let existing = tree.len();
        if existing > 0 {
            tracing::info!("{} colleges already present in database, skipping seed", existing);
            return Ok(0);
        }

        for college in &self.seed {
            tree.put(&college.id, college)?;
        }
        tracing::info!("Seeded {} colleges into database", self.seed.len());
        Ok(self.seed.len())
    }
}

fn rank_or_max(college: &College) -> u32 {
    if college.ranking == 0 {
        9999
    } else {
        college.ranking
    }
}

fn merge_by_identity(primary: Vec<College>, secondary: Vec<College>) -> Vec<College> {
    let mut merged = primary;
    let mut seen: std::collections::HashSet<String> = merged
        .iter()
        .map(|c| format!("{}::{}", c.id.to_lowercase(), c.name.to_lowercase()))
        .collect();

    for college in secondary {
        let key = format!("{}::{}", college.id.to_lowercase(), college.name.to_lowercase());
        if seen.insert(key) {
            merged.push(college);
        }
    }

    merged.sort_by_key(rank_or_max);
    merged
}

struct SeedEntry {
    name: &'static str,
    location: &'static str,
    state: &'static str,
    college_type: CollegeType,
    founded: u32,
    ranking: u32,
    fees: u64,
    placement_rate: f64,
    rating: f64,
    reviews_count: u32,
    description: &'static str,
    courses: &'static [&'static str],
    website: &'static str,
}

/// Build the seed catalog, assigning ids from load position exactly once.
pub fn seed_catalog() -> Vec<College> {
    SEED_DATA
        .iter()
        .enumerate()
        .map(|(index, entry)| College {
            id: IdUtils::index_id("college", index),
            name: entry.name.to_string(),
            location: entry.location.to_string(),
            state: entry.state.to_string(),
            college_type: entry.college_type,
            founded: entry.founded,
            ranking: entry.ranking,
            fees: entry.fees,
            placement_rate: entry.placement_rate,
            rating: entry.rating,
            reviews_count: entry.reviews_count,
            description: entry.description.to_string(),
            courses: entry.courses.iter().map(|c| c.to_string()).collect(),
            image_url: format!("/images/colleges/college_{}.jpg", index + 1),
            website: Some(entry.website.to_string()),
        })
        .collect()
}

const SEED_DATA: &[SeedEntry] = &[
    SeedEntry {
        name: "Indian Institute of Technology Bombay",
        location: "Mumbai, Maharashtra",
        state: "Maharashtra",
        college_type: CollegeType::Government,
        founded: 1958,
        ranking: 1,
        fees: 220_000,
        placement_rate: 96.0,
        rating: 4.8,
        reviews_count: 1240,
        description: "Premier engineering institute known for Computer Science and strong placement outcomes.",
        courses: &["B.Tech Computer Science", "B.Tech Electrical", "B.Tech Mechanical", "M.Tech", "MSc"],
        website: "https://www.iitb.ac.in",
    },
    SeedEntry {
        name: "Indian Institute of Technology Delhi",
        location: "New Delhi, Delhi",
        state: "Delhi",
        college_type: CollegeType::Government,
        founded: 1961,
        ranking: 2,
        fees: 215_000,
        placement_rate: 95.0,
        rating: 4.8,
        reviews_count: 1180,
        description: "Top-ranked IIT with a wide research portfolio and excellent industry connections.",
        courses: &["B.Tech Computer Science", "B.Tech Civil", "B.Tech Chemical", "M.Tech", "PhD"],
        website: "https://home.iitd.ac.in",
    },
    SeedEntry {
        name: "Indian Institute of Technology Madras",
        location: "Chennai, Tamil Nadu",
        state: "Tamil Nadu",
        college_type: CollegeType::Government,
        founded: 1959,
        ranking: 3,
        fees: 210_000,
        placement_rate: 94.0,
        rating: 4.7,
        reviews_count: 1105,
        description: "Consistently ranked first in NIRF engineering, with a thriving research park.",
        courses: &["B.Tech Aerospace", "B.Tech Computer Science", "B.Tech Ocean Engineering", "M.Tech"],
        website: "https://www.iitm.ac.in",
    },
    SeedEntry {
        name: "All India Institute of Medical Sciences Delhi",
        location: "New Delhi, Delhi",
        state: "Delhi",
        college_type: CollegeType::Government,
        founded: 1956,
        ranking: 4,
        fees: 6_000,
        placement_rate: 98.0,
        rating: 4.9,
        reviews_count: 890,
        description: "India's leading medical college and hospital with nominal tuition fees.",
        courses: &["MBBS", "MD", "MS", "BSc Nursing"],
        website: "https://www.aiims.edu",
    },
    SeedEntry {
        name: "National Institute of Technology Tiruchirappalli",
        location: "Tiruchirappalli, Tamil Nadu",
        state: "Tamil Nadu",
        college_type: CollegeType::Government,
        founded: 1964,
        ranking: 9,
        fees: 160_000,
        placement_rate: 91.0,
        rating: 4.5,
        reviews_count: 760,
        description: "The highest-ranked NIT, strong in core engineering branches and placements.",
        courses: &["B.Tech Computer Science", "B.Tech ECE", "B.Tech Production", "MBA"],
        website: "https://www.nitt.edu",
    },
    SeedEntry {
        name: "National Institute of Technology Karnataka",
        location: "Surathkal, Karnataka",
        state: "Karnataka",
        college_type: CollegeType::Government,
        founded: 1960,
        ranking: 12,
        fees: 155_000,
        placement_rate: 89.0,
        rating: 4.4,
        reviews_count: 645,
        description: "Beachside NIT with a strong coding culture and good core-sector placements.",
        courses: &["B.Tech Computer Science", "B.Tech Information Technology", "B.Tech Mining", "M.Tech"],
        website: "https://www.nitk.ac.in",
    },
    SeedEntry {
        name: "Birla Institute of Technology and Science Pilani",
        location: "Pilani, Rajasthan",
        state: "Rajasthan",
        college_type: CollegeType::Private,
        founded: 1964,
        ranking: 15,
        fees: 500_000,
        placement_rate: 92.0,
        rating: 4.6,
        reviews_count: 830,
        description: "Flagship private institute with a no-attendance policy and flexible dual degrees.",
        courses: &["B.E. Computer Science", "B.E. Electronics", "B.Pharm", "MSc Economics"],
        website: "https://www.bits-pilani.ac.in",
    },
    SeedEntry {
        name: "Vellore Institute of Technology",
        location: "Vellore, Tamil Nadu",
        state: "Tamil Nadu",
        college_type: CollegeType::Private,
        founded: 1984,
        ranking: 18,
        fees: 400_000,
        placement_rate: 88.0,
        rating: 4.2,
        reviews_count: 1520,
        description: "Large private university with a high volume of recruiters on campus every year.",
        courses: &["B.Tech Computer Science", "B.Tech Biotechnology", "BCA", "MCA"],
        website: "https://vit.ac.in",
    },
    SeedEntry {
        name: "Christian Medical College Vellore",
        location: "Vellore, Tamil Nadu",
        state: "Tamil Nadu",
        college_type: CollegeType::Private,
        founded: 1900,
        ranking: 20,
        fees: 90_000,
        placement_rate: 97.0,
        rating: 4.8,
        reviews_count: 410,
        description: "Highly selective private medical school famous for clinical training.",
        courses: &["MBBS", "BDS", "BSc Nursing", "Allied Health Sciences"],
        website: "https://www.cmch-vellore.edu",
    },
    SeedEntry {
        name: "Indian Institute of Science",
        location: "Bengaluru, Karnataka",
        state: "Karnataka",
        college_type: CollegeType::Government,
        founded: 1909,
        ranking: 5,
        fees: 35_000,
        placement_rate: 90.0,
        rating: 4.7,
        reviews_count: 385,
        description: "Research-first institute offering a four-year BS and renowned graduate programs.",
        courses: &["BS Research", "M.Tech", "PhD"],
        website: "https://iisc.ac.in",
    },
    SeedEntry {
        name: "Jadavpur University",
        location: "Kolkata, West Bengal",
        state: "West Bengal",
        college_type: CollegeType::Government,
        founded: 1955,
        ranking: 24,
        fees: 12_000,
        placement_rate: 85.0,
        rating: 4.3,
        reviews_count: 540,
        description: "State university with an exceptional engineering faculty at very low fees.",
        courses: &["B.E. Computer Science", "B.E. Electronics", "B.Arch", "BA"],
        website: "https://jadavpuruniversity.in",
    },
    SeedEntry {
        name: "Manipal Academy of Higher Education",
        location: "Manipal, Karnataka",
        state: "Karnataka",
        college_type: CollegeType::Private,
        founded: 1953,
        ranking: 30,
        fees: 450_000,
        placement_rate: 82.0,
        rating: 4.1,
        reviews_count: 980,
        description: "Private university town with engineering, medical, and allied programs.",
        courses: &["B.Tech Computer Science", "MBBS", "BDS", "B.Pharm"],
        website: "https://www.manipal.edu",
    },
    SeedEntry {
        name: "College of Engineering Pune",
        location: "Pune, Maharashtra",
        state: "Maharashtra",
        college_type: CollegeType::Government,
        founded: 1854,
        ranking: 42,
        fees: 95_000,
        placement_rate: 84.0,
        rating: 4.2,
        reviews_count: 470,
        description: "One of Asia's oldest engineering colleges with a strong Maharashtra intake.",
        courses: &["B.Tech Mechanical", "B.Tech Computer Science", "B.Tech Metallurgy", "M.Tech"],
        website: "https://www.coep.org.in",
    },
    SeedEntry {
        name: "SRM Institute of Science and Technology",
        location: "Chennai, Tamil Nadu",
        state: "Tamil Nadu",
        college_type: CollegeType::Private,
        founded: 1985,
        ranking: 48,
        fees: 380_000,
        placement_rate: 78.0,
        rating: 3.9,
        reviews_count: 1340,
        description: "Large private university with wide program choice and steady recruitment.",
        courses: &["B.Tech Computer Science", "B.Tech Mechatronics", "MBBS", "BBA"],
        website: "https://www.srmist.edu.in",
    },
    SeedEntry {
        name: "Delhi Technological University",
        location: "New Delhi, Delhi",
        state: "Delhi",
        college_type: CollegeType::Government,
        founded: 1941,
        ranking: 36,
        fees: 190_000,
        placement_rate: 87.0,
        rating: 4.3,
        reviews_count: 615,
        description: "Formerly Delhi College of Engineering, popular for software placements.",
        courses: &["B.Tech Computer Science", "B.Tech Software Engineering", "B.Tech IT", "MBA"],
        website: "http://www.dtu.ac.in",
    },
    SeedEntry {
        name: "Amity University Noida",
        location: "Noida, Uttar Pradesh",
        state: "Uttar Pradesh",
        college_type: CollegeType::Private,
        founded: 2005,
        ranking: 65,
        fees: 340_000,
        placement_rate: 72.0,
        rating: 3.7,
        reviews_count: 1710,
        description: "Sprawling private campus with programs across engineering, law, and media.",
        courses: &["B.Tech Computer Science", "BBA", "LLB", "B.Des"],
        website: "https://www.amity.edu",
    },
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::CollegeFilter;

    #[test]
    fn seed_ids_are_positional_and_stable() {
        let catalog = seed_catalog();
        assert_eq!(catalog[0].id, "college_1");
        assert_eq!(catalog[0].name, "Indian Institute of Technology Bombay");
        assert_eq!(catalog.last().unwrap().id, format!("college_{}", catalog.len()));
    }

    #[test]
    fn lookup_resolves_seed_ids() {
        let store = CatalogStore::new(None);
        let first = store.lookup("college_1").unwrap();
        assert_eq!(first.name, "Indian Institute of Technology Bombay");
        assert!(store.lookup("college_9999").is_none());
        assert!(store.lookup("not-an-id").is_none());
    }

    #[test]
    fn admin_create_update_delete_cycle() {
        let store = CatalogStore::new(None);
        let mut payload = store.all()[0].clone();
        payload.name = "Test College of Engineering".to_string();
        let created = store.admin_create(payload.clone());
        assert!(created.id.starts_with("college_custom_"));

        payload.ranking = 7;
        let updated = store.admin_update(&created.id, payload).unwrap();
        assert_eq!(updated.ranking, 7);
        assert_eq!(updated.id, created.id);

        assert!(store.admin_delete(&created.id));
        assert!(!store.admin_delete(&created.id));
    }

    #[test]
    fn admin_list_is_sorted_by_ranking() {
        let store = CatalogStore::new(None);
        let list = store.admin_list();
        assert!(list.windows(2).all(|w| w[0].ranking <= w[1].ranking));
    }

    #[test]
    fn database_tier_seeds_once_and_merges() {
        let dir = tempfile::tempdir().unwrap();
        let storage = crate::storage::Storage::open(dir.path().join("db")).unwrap();
        let store = CatalogStore::new(Some(storage.colleges.clone()));

        let seeded = store.seed_database().unwrap();
        assert_eq!(seeded, store.all().len());
        assert_eq!(store.seed_database().unwrap(), 0);

        let (list, source) = store.list(&CollegeFilter::default());
        assert_eq!(source, CatalogSource::DatabaseMerged);
        assert_eq!(list.len(), store.all().len());
        assert!(list.windows(2).all(|w| {
            let a = if w[0].ranking == 0 { 9999 } else { w[0].ranking };
            let b = if w[1].ranking == 0 { 9999 } else { w[1].ranking };
            a <= b
        }));
    }
}
