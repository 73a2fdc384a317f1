//! Operator pipelines, eager and lazy strategies on shared fixtures.

use std::sync::Arc;

use rankdb_core::conditions::{on, select, Similarity};
use rankdb_core::degree::Degree;
use rankdb_core::lattice::Lattice;
use rankdb_core::operators::{
    CachedSource, Intersect, Join, LazyJoin, LazyProject, LazySelect, LazyUnion, Project,
    Projection, RecordSource, Select, TableScan, Union,
};
use rankdb_core::records::{Record, Table};
use rankdb_core::schema::{Attribute, Schema};
use rankdb_core::values::DataType;

fn people_schema() -> Arc<Schema> {
    Arc::new(
        Schema::try_new([
            Attribute::new("id", DataType::Int64),
            Attribute::new("name", DataType::Utf8),
            Attribute::new("city", DataType::Utf8),
        ])
        .unwrap(),
    )
}

fn cities_schema() -> Arc<Schema> {
    Arc::new(
        Schema::try_new([
            Attribute::new("city", DataType::Utf8),
            Attribute::new("country", DataType::Utf8),
        ])
        .unwrap(),
    )
}

fn people() -> Table {
    let schema = people_schema();
    Table::try_from_records(
        schema.clone(),
        [
            (1_i64, "ada", "london", 1.0),
            (2, "grace", "new york", 0.9),
            (3, "alan", "london", 0.8),
            (4, "edsger", "austin", 1.0),
        ]
        .iter()
        .map(|(id, name, city, degree)| {
            Record::try_new(
                schema.clone(),
                vec![(*id).into(), (*name).into(), (*city).into()],
                Degree::new(*degree).unwrap(),
            )
            .unwrap()
        }),
    )
    .unwrap()
}

fn cities() -> Table {
    let schema = cities_schema();
    Table::try_from_records(
        schema.clone(),
        [
            ("london", "uk", 1.0),
            ("new york", "usa", 1.0),
            ("austin", "usa", 0.5),
        ]
        .iter()
        .map(|(city, country, degree)| {
            Record::try_new(
                schema.clone(),
                vec![(*city).into(), (*country).into()],
                Degree::new(*degree).unwrap(),
            )
            .unwrap()
        }),
    )
    .unwrap()
}

fn materialize(mut source: impl RecordSource) -> Table {
    let schema = source.schema().clone();
    let mut records = Vec::new();
    while let Some(record) = source.next() {
        records.push(record);
    }
    Table::try_from_records(schema, records).unwrap()
}

#[test]
fn select_join_project_pipeline_eager_and_lazy_agree() {
    let people = people();
    let cities = cities();

    // Eager: londoners joined to their country, projected to (name, country).
    let select = Select::try_new(
        people.schema().clone(),
        select::eq("city", "london"),
        Lattice::Godel,
    )
    .unwrap();
    let londoners = select.execute(&people).unwrap();

    let join = Join::try_new(
        londoners.schema().clone(),
        cities.schema().clone(),
        vec![on::eq("city", "city")],
        Lattice::Godel,
    )
    .unwrap();
    let joined = join.execute(&londoners, &cities).unwrap();

    let project = Project::try_new(
        join.output_schema().clone(),
        Projection::Rename(vec![
            ("name".to_string(), "name".to_string()),
            ("country".to_string(), "country".to_string()),
        ]),
    )
    .unwrap();
    let eager = project.execute(&joined).unwrap();

    // Lazy: the same pipeline as one pull chain.
    let lazy = materialize(
        LazyProject::try_new(
            LazyJoin::try_new(
                LazySelect::try_new(
                    TableScan::new(&people),
                    select::eq("city", "london"),
                    Lattice::Godel,
                )
                .unwrap(),
                TableScan::new(&cities),
                vec![on::eq("city", "city")],
                Lattice::Godel,
            )
            .unwrap(),
            Projection::Rename(vec![
                ("name".to_string(), "name".to_string()),
                ("country".to_string(), "country".to_string()),
            ]),
        )
        .unwrap(),
    );

    assert_eq!(eager, lazy);
    assert_eq!(2, eager.len());

    let ada = eager
        .find_no_rank(
            &Record::try_new(
                eager.schema().clone(),
                vec!["ada".into(), "uk".into()],
                Degree::ONE,
            )
            .unwrap(),
        )
        .unwrap();
    assert_eq!(Degree::ONE, ada.degree());

    let alan = eager
        .find_no_rank(
            &Record::try_new(
                eager.schema().clone(),
                vec!["alan".into(), "uk".into()],
                Degree::ONE,
            )
            .unwrap(),
        )
        .unwrap();
    assert_eq!(Degree::new(0.8).unwrap(), alan.degree());
}

#[test]
fn union_and_intersection_complement_each_other() {
    let people = people();
    let schema = people.schema().clone();

    let londoners = Select::try_new(
        schema.clone(),
        select::eq("city", "london"),
        Lattice::Godel,
    )
    .unwrap()
    .execute(&people)
    .unwrap();

    let similar_to_ada = Select::try_new(
        schema.clone(),
        select::similar("name", "ada", Similarity::text()),
        Lattice::Godel,
    )
    .unwrap()
    .execute(&people)
    .unwrap();

    let union = Union::try_new(londoners.schema(), similar_to_ada.schema(), Lattice::Godel)
        .unwrap()
        .execute(&londoners, &similar_to_ada)
        .unwrap();
    let intersection = Intersect::try_new(
        londoners.schema(),
        similar_to_ada.schema(),
        Lattice::Godel,
    )
    .unwrap()
    .execute(&londoners, &similar_to_ada)
    .unwrap();

    assert!(union.len() >= londoners.len().max(similar_to_ada.len()));
    assert!(intersection.len() <= londoners.len().min(similar_to_ada.len()));

    // Every record present in both inputs appears in the union at the
    // supremum of its degrees and in the intersection at the infimum.
    for record in intersection.iter() {
        let l = londoners.find_no_rank(&record).unwrap().degree();
        let r = similar_to_ada.find_no_rank(&record).unwrap().degree();
        assert_eq!(l.min(r), record.degree());
        assert_eq!(
            l.max(r),
            union.find_no_rank(&record).unwrap().degree()
        );
    }

    // Lazy union agrees.
    let lazy_union = materialize(
        LazyUnion::try_new(
            TableScan::new(&londoners),
            TableScan::new(&similar_to_ada),
            Lattice::Godel,
        )
        .unwrap(),
    );
    assert_eq!(union, lazy_union);
}

#[test]
fn cached_source_feeds_two_pipeline_stages() {
    let people = people();

    // One upstream scan fanned out to two consumers via the cache wrapper:
    // a join of the relation against itself on equal city.
    let mut cached = CachedSource::new(TableScan::new(&people));
    let mut left_records = Vec::new();
    while let Some(record) = cached.next() {
        left_records.push(record);
    }
    let left = Table::try_from_records(people.schema().clone(), left_records).unwrap();
    cached.restart();

    let join = LazyJoin::try_new(
        TableScan::new(&left),
        cached,
        vec![on::eq("city", "city")],
        Lattice::Godel,
    )
    .unwrap();
    let joined = materialize(join);

    // london pairs: (ada, ada), (ada, alan), (alan, ada), (alan, alan);
    // plus the self-pairs of the two singleton cities.
    assert_eq!(6, joined.len());
    assert!(
        joined
            .iter()
            .all(|r| r.value("left.city").unwrap() == r.value("right.city").unwrap())
    );
}

#[test]
fn graded_selection_discounts_by_similarity() {
    let people = people();

    let near_three = Select::try_new(
        people.schema().clone(),
        select::similar("id", 3_i64, Similarity::linear(4.0)),
        Lattice::Goguen,
    )
    .unwrap()
    .execute(&people)
    .unwrap();

    // id 3 at distance 0 keeps 0.8; id 4 at distance 1 scores 0.75.
    let alan = near_three
        .find_no_rank(
            &Record::try_new(
                people.schema().clone(),
                vec![3_i64.into(), "alan".into(), "london".into()],
                Degree::ONE,
            )
            .unwrap(),
        )
        .unwrap();
    assert_eq!(Degree::new(0.8).unwrap(), alan.degree());

    let edsger = near_three
        .find_no_rank(
            &Record::try_new(
                people.schema().clone(),
                vec![4_i64.into(), "edsger".into(), "austin".into()],
                Degree::ONE,
            )
            .unwrap(),
        )
        .unwrap();
    assert_eq!(Degree::new(0.75).unwrap(), edsger.degree());
}

#[test]
fn join_output_refers_to_both_sides_with_prefixes() {
    let people = people();
    let join = Join::try_new(
        people.schema().clone(),
        people.schema().clone(),
        vec![on::eq("id", "id")],
        Lattice::Godel,
    )
    .unwrap();

    let names: Vec<String> = join
        .output_schema()
        .iter()
        .map(|(name, _)| name.to_string())
        .collect();
    assert_eq!(
        vec![
            "left.id",
            "left.name",
            "left.city",
            "right.id",
            "right.name",
            "right.city"
        ],
        names
    );

    let out = join.execute(&people, &people).unwrap();
    assert_eq!(people.len(), out.len());
    for record in out.iter() {
        assert_eq!(
            record.value("left.id").unwrap(),
            record.value("right.id").unwrap()
        );
    }
}
