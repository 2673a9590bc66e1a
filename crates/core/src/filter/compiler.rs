use tracing::debug;

use crate::query::{
    MatchMode, Operand, Operator, PagingKind, PropertyCondition, QueryParameter, QueryValue,
};
use crate::schema::{FilterConfig, FilterMetadata, FilterTarget};

use super::{
    ColumnValueFilter, CompareOp, Comparator, Filter, FilterError, FilterOperator, Scan,
};

/// Lowers query-parameter trees into native scans.
///
/// Compilation is pure: the same tree and metadata always produce the same
/// scan.
pub struct FilterCompiler<'a, M: FilterMetadata + ?Sized> {
    metadata: &'a M,
}

impl<'a, M: FilterMetadata + ?Sized> FilterCompiler<'a, M> {
    pub fn new(metadata: &'a M) -> Self {
        Self { metadata }
    }

    /// Builds a complete scan for `params`, AND-combining the top level.
    ///
    /// An empty tree yields a match-all filter so unconstrained reads still
    /// produce a well-formed scan.
    pub fn form_scan(&self, params: &[QueryParameter]) -> Result<Scan, FilterError> {
        let mut scan = Scan::new();
        let filter = self.compile("", params, FilterOperator::MustPassAll, &mut scan)?;
        scan.filter = Some(filter.unwrap_or_else(Filter::match_all));
        Ok(scan)
    }

    /// Compiles one level of the tree.
    ///
    /// Projections and `FirstResult` paging are recorded on `scan` rather
    /// than returned as predicates. Returns `None` when a non-empty level
    /// produced no predicate (for example, only projections).
    pub fn compile(
        &self,
        prefix: &str,
        params: &[QueryParameter],
        operator: FilterOperator,
        scan: &mut Scan,
    ) -> Result<Option<Filter>, FilterError> {
        if params.is_empty() {
            return Ok(Some(Filter::match_all()));
        }

        let mut filters = Vec::new();
        for param in params {
            let filter = match param {
                QueryParameter::Conjunction { children } => {
                    self.compile(prefix, children, FilterOperator::MustPassAll, scan)?
                }
                QueryParameter::Disjunction { children } => {
                    self.compile(prefix, children, FilterOperator::MustPassOne, scan)?
                }
                QueryParameter::NestedProperty { name, children } => self.compile(
                    &property_name(prefix, name),
                    children,
                    FilterOperator::MustPassAll,
                    scan,
                )?,
                QueryParameter::PropertyCondition(condition) => {
                    self.condition_filter(prefix, condition)?
                }
                QueryParameter::Projection { name } => {
                    self.add_projection(&property_name(prefix, name), scan);
                    None
                }
                QueryParameter::Paging {
                    kind: PagingKind::FirstResult,
                    value,
                } => {
                    scan.start_row = Some(value.to_bytes());
                    None
                }
                QueryParameter::Paging {
                    kind: PagingKind::MaxResults,
                    ..
                }
                | QueryParameter::ValueOnly { .. } => None,
            };
            filters.extend(filter);
        }

        Ok(match filters.len() {
            0 => None,
            1 => filters.pop(),
            _ => Some(Filter::List { operator, filters }),
        })
    }

    fn condition_filter(
        &self,
        prefix: &str,
        condition: &PropertyCondition,
    ) -> Result<Option<Filter>, FilterError> {
        let property = property_name(prefix, &condition.name);
        let config = self
            .metadata
            .filter_config(&property)
            .ok_or_else(|| FilterError::UnresolvedProperty(property.clone()))?;

        let filter = match (condition.operator, &condition.operand) {
            (Operator::IsEmpty | Operator::IsNull, _) => {
                let mut filter = cell_filter(config, CompareOp::Equal, Comparator::Binary(vec![]));
                filter.set_filter_if_missing(false);
                Some(filter)
            }
            (Operator::IsNotEmpty | Operator::IsNotNull, _) => {
                let mut filter =
                    cell_filter(config, CompareOp::NotEqual, Comparator::Binary(vec![]));
                filter.set_filter_if_missing(true);
                Some(filter)
            }
            (Operator::StringLike, Operand::Single(value)) => {
                let value = value.to_string();
                let comparator = match condition.match_mode.unwrap_or_default() {
                    MatchMode::Exact => Comparator::Binary(value.into_bytes()),
                    MatchMode::Start => Comparator::BinaryPrefix(value.into_bytes()),
                    MatchMode::End => Comparator::BinarySuffix(value.into_bytes()),
                    MatchMode::Anywhere => Comparator::Substring(value),
                };
                Some(cell_filter(config, CompareOp::Equal, comparator))
            }
            (Operator::Between, Operand::Pair(first, second)) => {
                let comparator = Comparator::Range {
                    first: first.to_bytes(),
                    second: second.to_bytes(),
                };
                Some(cell_filter(config, CompareOp::Equal, comparator))
            }
            (Operator::IsIn, Operand::Multi(values)) => Some(in_filter(config, values)),
            (Operator::IsNotIn, Operand::Multi(values)) => {
                Some(Filter::Not(Box::new(in_filter(config, values))))
            }
            (operator, operand) => match (ordering_op(operator), operand) {
                (Some(op), Operand::Single(value)) => {
                    Some(cell_filter(config, op, Comparator::Binary(value.to_bytes())))
                }
                (Some(op), Operand::None) => {
                    Some(cell_filter(config, op, Comparator::Binary(vec![])))
                }
                _ => {
                    debug!(
                        property = %property,
                        operator = ?operator,
                        "Ignoring unsupported operator/operand combination"
                    );
                    None
                }
            },
        };
        Ok(filter)
    }

    fn add_projection(&self, name: &str, scan: &mut Scan) {
        let (property, dynamic) = match name.split_once(':') {
            Some((property, dynamic)) => (property, Some(dynamic.trim())),
            None => (name, None),
        };
        let Some(config) = self.metadata.filter_config(property) else {
            debug!(property = %property, "Skipping unresolved projection");
            return;
        };
        let Some(family) = config.column_family() else {
            return;
        };

        match (dynamic, config.column_qualifier()) {
            (Some(qualifier), _) if !qualifier.is_empty() => scan.add_column(family, qualifier),
            (_, Some(qualifier)) if !config.is_qualifier_range_prefix() => {
                scan.add_column(family, qualifier)
            }
            _ => scan.add_family(family),
        }
    }
}

fn property_name(prefix: &str, name: &str) -> String {
    if prefix.trim().is_empty() {
        name.to_string()
    } else {
        format!("{prefix}.{name}")
    }
}

fn ordering_op(operator: Operator) -> Option<CompareOp> {
    match operator {
        Operator::Equal => Some(CompareOp::Equal),
        Operator::NotEqual => Some(CompareOp::NotEqual),
        Operator::Less => Some(CompareOp::Less),
        Operator::LessEqual => Some(CompareOp::LessOrEqual),
        Operator::Greater => Some(CompareOp::Greater),
        Operator::GreaterEqual => Some(CompareOp::GreaterOrEqual),
        _ => None,
    }
}

fn in_filter(config: &FilterConfig, values: &[QueryValue]) -> Filter {
    Filter::List {
        operator: FilterOperator::MustPassOne,
        filters: values
            .iter()
            .map(|value| cell_filter(config, CompareOp::Equal, Comparator::Binary(value.to_bytes())))
            .collect(),
    }
}

/// Picks the physical predicate kind for a property.
fn cell_filter(config: &FilterConfig, op: CompareOp, comparator: Comparator) -> Filter {
    match &config.target {
        FilterTarget::RowKey => Filter::RowKey { op, comparator },
        FilterTarget::QualifierRangePrefix { family } => Filter::Qualifier {
            family: family.clone(),
            op,
            comparator,
        },
        FilterTarget::Column { family, qualifier } => Filter::ColumnValue(ColumnValueFilter {
            family: family.clone(),
            qualifier: qualifier.clone().filter(|qualifier| !qualifier.is_empty()),
            op,
            comparator,
            filter_if_missing: config.filter_if_missing,
            latest_version_only: config.latest_version_only,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::ColumnSelector;
    use crate::row::{Column, Row};
    use crate::schema::SchemaInfo;

    fn schema() -> SchemaInfo<String> {
        SchemaInfo::new("people")
            .with_filter("id", FilterConfig::row_key())
            .with_filter("name", FilterConfig::column("info", "name"))
            .with_filter(
                "age",
                FilterConfig::column("info", "age").with_filter_if_missing(true),
            )
            .with_filter("email", FilterConfig::column("info", "email"))
            .with_filter("address.city", FilterConfig::column("addr", "city"))
            .with_filter("address.zip", FilterConfig::column("addr", "zip"))
            .with_filter("tags", FilterConfig::qualifier_range_prefix("tags"))
            .with_filter("attributes", FilterConfig::family("attr"))
    }

    fn compile(params: &[QueryParameter]) -> Scan {
        FilterCompiler::new(&schema()).form_scan(params).unwrap()
    }

    fn accepts(params: &[QueryParameter], row: &Row) -> bool {
        compile(params).accepts(row)
    }

    fn person(key: &str, name: &str, age: &str) -> Row {
        Row::new(key)
            .with_cell("info", "name", name)
            .with_cell("info", "age", age)
    }

    #[test]
    fn test_empty_tree_is_match_all() {
        let scan = compile(&[]);
        assert_eq!(scan.filter, Some(Filter::match_all()));
        assert!(scan.accepts(&Row::new("anything")));
    }

    #[test]
    fn test_leafless_tree_is_match_all() {
        let scan = compile(&[QueryParameter::max_results(5), QueryParameter::value("x")]);
        assert_eq!(scan.filter, Some(Filter::match_all()));
    }

    #[test]
    fn test_single_predicate_is_unwrapped() {
        let scan = compile(&[QueryParameter::equal("name", "Ada")]);
        assert!(matches!(scan.filter, Some(Filter::ColumnValue(_))));
    }

    #[test]
    fn test_two_predicates_are_combined_with_and() {
        let params = [
            QueryParameter::equal("name", "Ada"),
            QueryParameter::greater("age", 20),
        ];
        let scan = compile(&params);

        assert!(matches!(
            &scan.filter,
            Some(Filter::List { operator: FilterOperator::MustPassAll, filters }) if filters.len() == 2
        ));
        assert!(scan.accepts(&person("1", "Ada", "36")));
        assert!(!scan.accepts(&person("2", "Ada", "19")));
    }

    #[test]
    fn test_disjunction() {
        let params = [QueryParameter::or(vec![
            QueryParameter::equal("name", "Ada"),
            QueryParameter::equal("name", "Grace"),
        ])];

        assert!(accepts(&params, &person("1", "Ada", "36")));
        assert!(accepts(&params, &person("2", "Grace", "45")));
        assert!(!accepts(&params, &person("3", "Alan", "41")));
    }

    #[test]
    fn test_ordering_operators() {
        let row = person("1", "Ada", "36");

        assert!(accepts(&[QueryParameter::less("age", 40)], &row));
        assert!(accepts(&[QueryParameter::less_equal("age", 36)], &row));
        assert!(!accepts(&[QueryParameter::greater("age", 36)], &row));
        assert!(accepts(&[QueryParameter::greater_equal("age", 36)], &row));
        assert!(accepts(&[QueryParameter::not_equal("name", "Grace")], &row));
    }

    #[test]
    fn test_unresolved_property_is_configuration_error() {
        let result = FilterCompiler::new(&schema()).form_scan(&[QueryParameter::and(vec![
            QueryParameter::equal("name", "Ada"),
            QueryParameter::equal("nickname", "Countess"),
        ])]);

        assert_eq!(
            result,
            Err(FilterError::UnresolvedProperty("nickname".to_string()))
        );
    }

    #[test]
    fn test_nested_property_prefixes_names() {
        let params = [QueryParameter::nested(
            "address",
            vec![QueryParameter::like("city", "Mon", MatchMode::Start)],
        )];
        let row = Row::new("1").with_cell("addr", "city", "Montevideo");
        let other = Row::new("2").with_cell("addr", "city", "Madrid");

        assert!(accepts(&params, &row));
        assert!(!accepts(&params, &other));
    }

    #[test]
    fn test_nested_group_keeps_prefix() {
        let params = [QueryParameter::nested(
            "address",
            vec![QueryParameter::or(vec![
                QueryParameter::equal("city", "Montevideo"),
                QueryParameter::equal("zip", "11000"),
            ])],
        )];
        let row = Row::new("1").with_cell("addr", "zip", "11000");

        assert!(accepts(&params, &row));
    }

    #[test]
    fn test_string_like_modes() {
        let row = Row::new("1").with_cell("info", "name", "Augusta Ada King");

        let exact = QueryParameter::like("name", "Augusta Ada King", MatchMode::Exact);
        let start = QueryParameter::like("name", "Augusta", MatchMode::Start);
        let end = QueryParameter::like("name", "King", MatchMode::End);
        let anywhere = QueryParameter::like("name", "ada", MatchMode::Anywhere);
        let miss = QueryParameter::like("name", "Ada", MatchMode::Start);

        assert!(accepts(&[exact], &row));
        assert!(accepts(&[start], &row));
        assert!(accepts(&[end], &row));
        assert!(accepts(&[anywhere], &row));
        assert!(!accepts(&[miss], &row));
    }

    #[test]
    fn test_string_like_without_mode_is_exact() {
        let param = QueryParameter::PropertyCondition(PropertyCondition {
            name: "name".to_string(),
            operator: Operator::StringLike,
            operand: Operand::Single("Ada".into()),
            match_mode: None,
        });
        let scan = compile(&[param]);

        assert!(matches!(
            &scan.filter,
            Some(Filter::ColumnValue(ColumnValueFilter { comparator: Comparator::Binary(value), .. }))
                if value == b"Ada"
        ));
    }

    #[test]
    fn test_between_is_inclusive() {
        let params = [QueryParameter::between("age", 30, 40)];

        assert!(accepts(&params, &person("1", "Ada", "30")));
        assert!(accepts(&params, &person("2", "Bob", "40")));
        assert!(!accepts(&params, &person("3", "Cy", "41")));
    }

    #[test]
    fn test_is_in_accepts_exactly_members() {
        let params = [QueryParameter::is_in("name", ["Ada", "Grace"])];

        assert!(accepts(&params, &person("1", "Ada", "36")));
        assert!(accepts(&params, &person("2", "Grace", "45")));
        assert!(!accepts(&params, &person("3", "Alan", "41")));
    }

    #[test]
    fn test_is_not_in_negates_is_in() {
        let values = ["Ada", "Grace"];
        let is_in = [QueryParameter::is_in("name", values)];
        let not_in = [QueryParameter::not_in("name", values)];

        for row in [
            person("1", "Ada", "36"),
            person("2", "Grace", "45"),
            person("3", "Alan", "41"),
            Row::new("4"),
        ] {
            assert_eq!(accepts(&is_in, &row), !accepts(&not_in, &row));
        }
    }

    #[test]
    fn test_is_not_in_wraps_in_not() {
        let scan = compile(&[QueryParameter::not_in("name", ["Ada"])]);
        assert!(matches!(scan.filter, Some(Filter::Not(_))));
    }

    #[test]
    fn test_empty_and_null_accept_missing_columns() {
        let missing = person("1", "Ada", "36");
        let blank = missing.clone().with_cell("info", "email", "");
        let present = missing.clone().with_cell("info", "email", "ada@example.com");

        for param in [QueryParameter::empty("email"), QueryParameter::null("email")] {
            assert!(accepts(&[param.clone()], &missing));
            assert!(accepts(&[param.clone()], &blank));
            assert!(!accepts(&[param], &present));
        }

        for param in [
            QueryParameter::not_empty("email"),
            QueryParameter::not_null("email"),
        ] {
            assert!(!accepts(&[param.clone()], &missing));
            assert!(!accepts(&[param.clone()], &blank));
            assert!(accepts(&[param], &present));
        }
    }

    #[test]
    fn test_column_missing_policy_comes_from_config() {
        let without_age = Row::new("1").with_cell("info", "name", "Ada");

        // `age` filters rows missing the column; `name` does not.
        assert!(!accepts(&[QueryParameter::equal("age", 36)], &without_age));
        assert!(accepts(
            &[QueryParameter::equal("name", "Ada")],
            &Row::new("2").with_cell("info", "age", "36")
        ));
    }

    #[test]
    fn test_row_key_predicate() {
        let params = [QueryParameter::like("id", "user-", MatchMode::Start)];

        assert!(matches!(
            compile(&params).filter,
            Some(Filter::RowKey { .. })
        ));
        assert!(accepts(&params, &Row::new("user-1")));
        assert!(!accepts(&params, &Row::new("order-1")));
    }

    #[test]
    fn test_qualifier_range_prefix_predicate() {
        let params = [QueryParameter::like("tags", "lang-", MatchMode::Start)];
        let row = Row::new("1").with_cell("tags", "lang-rust", "");

        assert!(matches!(
            compile(&params).filter,
            Some(Filter::Qualifier { .. })
        ));
        assert!(accepts(&params, &row));
        assert!(!accepts(&params, &Row::new("2").with_cell("tags", "os-linux", "")));
    }

    #[test]
    fn test_family_predicate_matches_any_qualifier() {
        let params = [QueryParameter::equal("attributes", "blue")];
        let row = Row::new("1")
            .with_cell("attr", "eyes", "blue")
            .with_cell("attr", "hair", "brown");

        assert!(accepts(&params, &row));
    }

    #[test]
    fn test_first_result_sets_start_row() {
        let scan = compile(&[QueryParameter::first_result("person-5")]);

        assert_eq!(scan.start_row, Some(b"person-5".to_vec()));
        assert_eq!(scan.filter, Some(Filter::match_all()));
    }

    #[test]
    fn test_projections() {
        let scan = compile(&[
            QueryParameter::projection("name"),
            QueryParameter::projection("attributes:eyes"),
            QueryParameter::projection("tags"),
            QueryParameter::projection("unknown"),
            QueryParameter::projection("id"),
        ]);

        assert_eq!(
            scan.columns,
            vec![
                ColumnSelector::Column(Column::new("info", "name")),
                ColumnSelector::Column(Column::new("attr", "eyes")),
                ColumnSelector::Family(b"tags".to_vec()),
            ]
        );
        assert_eq!(scan.filter, Some(Filter::match_all()));
    }

    #[test]
    fn test_unsupported_combination_is_ignored() {
        let param = QueryParameter::PropertyCondition(PropertyCondition {
            name: "age".to_string(),
            operator: Operator::Between,
            operand: Operand::Single(QueryValue::Int(3)),
            match_mode: None,
        });

        assert_eq!(compile(&[param]).filter, Some(Filter::match_all()));
    }

    #[test]
    fn test_compilation_is_idempotent() {
        let params = vec![
            QueryParameter::equal("name", "Ada"),
            QueryParameter::nested(
                "address",
                vec![QueryParameter::not_in("city", ["Madrid", "Paris"])],
            ),
            QueryParameter::projection("name"),
            QueryParameter::first_result("p-1"),
        ];

        assert_eq!(compile(&params), compile(&params));
    }
}
