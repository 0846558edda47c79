mod common;

use common::{account, bio};
use luxe_matches::{
    models::BioDataType,
    query::{
        BioDataFilter, BioDataQuery, Pagination, SimilarBioData, UserSearch, UserSearchQuery,
        build_bio_data_filter, build_pagination, build_user_search,
    },
};
use mongodb::bson::{Bson, doc};

const MAX: u64 = 100;

// --- Pagination ---

#[test]
fn test_pagination_defaults_to_first_page_of_ten() {
    assert_eq!(
        build_pagination(None, None, MAX),
        Pagination { skip: 0, limit: 10 }
    );
}

#[test]
fn test_pagination_skips_whole_pages() {
    assert_eq!(
        build_pagination(Some("2"), Some("5"), MAX),
        Pagination { skip: 5, limit: 5 }
    );
    assert_eq!(
        build_pagination(Some("4"), Some("20"), MAX),
        Pagination { skip: 60, limit: 20 }
    );
}

#[test]
fn test_pagination_falls_back_on_zero_and_garbage() {
    assert_eq!(
        build_pagination(Some("0"), Some("0"), MAX),
        Pagination { skip: 0, limit: 10 }
    );
    assert_eq!(
        build_pagination(Some("two"), Some("ten"), MAX),
        Pagination { skip: 0, limit: 10 }
    );
}

#[test]
fn test_pagination_clamps_negative_values_and_oversized_limits() {
    assert_eq!(
        build_pagination(Some("-3"), Some("-1"), MAX),
        Pagination { skip: 0, limit: 1 }
    );
    assert_eq!(
        build_pagination(Some("1"), Some("5000"), MAX),
        Pagination { skip: 0, limit: 100 }
    );
    assert_eq!(
        build_pagination(Some("3"), Some("50"), 20),
        Pagination { skip: 40, limit: 20 }
    );
}

// --- Biodata filter ---

#[test]
fn test_empty_query_uses_default_age_range() {
    let filter = build_bio_data_filter(&BioDataQuery::default());
    assert_eq!(filter, BioDataFilter::default());
    assert_eq!(
        filter.to_document(),
        doc! {
            "bioData": { "$exists": true },
            "bioData.age": { "$gte": 18_i64, "$lte": 99_i64 },
        }
    );
}

#[test]
fn test_gender_and_min_age_render_to_document() {
    let query = BioDataQuery {
        gender: Some("Female".to_string()),
        min_age: Some("25".to_string()),
        ..BioDataQuery::default()
    };
    let document = build_bio_data_filter(&query).to_document();

    assert_eq!(document.get_str("bioData.bioDataType").unwrap(), "Female");
    assert!(!document.contains_key("bioData.presentDivision"));

    let age = document.get_document("bioData.age").unwrap();
    assert_eq!(age.get("$gte"), Some(&Bson::Int64(25)));
    assert_eq!(age.get("$lte"), Some(&Bson::Int64(99)));
}

#[test]
fn test_blank_filters_are_ignored() {
    let query = BioDataQuery {
        gender: Some("  ".to_string()),
        division: Some(String::new()),
        min_age: Some("0".to_string()),
        max_age: Some("old".to_string()),
        ..BioDataQuery::default()
    };
    assert_eq!(build_bio_data_filter(&query), BioDataFilter::default());
}

#[test]
fn test_filter_matches_accounts_in_memory() {
    let filter = BioDataFilter {
        gender: Some("Female".to_string()),
        division: Some("Dhaka".to_string()),
        min_age: 20,
        max_age: 30,
    };

    let hit = account("a@x", "A", Some(bio(1, BioDataType::Female, "Dhaka", 30)));
    let wrong_gender = account("b@x", "B", Some(bio(2, BioDataType::Male, "Dhaka", 25)));
    let wrong_division = account("c@x", "C", Some(bio(3, BioDataType::Female, "Sylhet", 25)));
    let too_old = account("d@x", "D", Some(bio(4, BioDataType::Female, "Dhaka", 31)));
    let no_bio = account("e@x", "E", None);

    assert!(filter.matches(&hit));
    assert!(!filter.matches(&wrong_gender));
    assert!(!filter.matches(&wrong_division));
    assert!(!filter.matches(&too_old));
    assert!(!filter.matches(&no_bio));
}

// --- Similar profiles ---

#[test]
fn test_similar_excludes_the_person_itself() {
    let similar = SimilarBioData {
        bio_data_type: BioDataType::Male,
        exclude_bio_data_id: Some(7),
    };

    assert_eq!(
        similar.to_document(),
        doc! {
            "bioData.bioDataType": "Male",
            "bioData.bioDataId": { "$ne": 7_i64 },
        }
    );

    let itself = account("a@x", "A", Some(bio(7, BioDataType::Male, "Dhaka", 30)));
    let other = account("b@x", "B", Some(bio(8, BioDataType::Male, "Khulna", 40)));
    let female = account("c@x", "C", Some(bio(9, BioDataType::Female, "Dhaka", 30)));

    assert!(!similar.matches(&itself));
    assert!(similar.matches(&other));
    assert!(!similar.matches(&female));
}

// --- User search ---

#[test]
fn test_user_search_without_term_matches_everything() {
    let search = build_user_search(&UserSearchQuery::default());
    assert_eq!(search, UserSearch::default());
    assert!(search.to_document().is_empty());
    assert!(search.matches(&account("a@x", "Anyone", None)));
}

#[test]
fn test_user_search_is_case_insensitive_substring() {
    let search = build_user_search(&UserSearchQuery {
        q: Some("rah".to_string()),
        ..UserSearchQuery::default()
    });

    assert_eq!(
        search.to_document(),
        doc! { "name": { "$regex": "rah", "$options": "i" } }
    );
    assert!(search.matches(&account("a@x", "Farhana Rahman", None)));
    assert!(search.matches(&account("b@x", "RAHIM", None)));
    assert!(!search.matches(&account("c@x", "Karim", None)));
}

#[test]
fn test_user_search_escapes_regex_metacharacters() {
    let search = UserSearch {
        term: Some("a.b(c)".to_string()),
    };
    assert_eq!(
        search.to_document(),
        doc! { "name": { "$regex": "a\\.b\\(c\\)", "$options": "i" } }
    );
    assert!(search.matches(&account("a@x", "xA.B(C)y", None)));
    assert!(!search.matches(&account("b@x", "aXb c", None)));
}
