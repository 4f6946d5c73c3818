use crate::{Error, MaterializedResultSet, OrderColumns, QueryFragment, Result, SqlWriter};

/// Page request, `page` starts from 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pager {
    pub page: u64,
    pub per_page: u64,
}

impl Pager {
    pub fn new(page: u64, per_page: u64) -> Self {
        Self {
            page: page.max(1),
            per_page,
        }
    }
    /// Rows to skip, `None` when the page lies beyond what a `u64` can count.
    pub fn offset(&self) -> Option<u64> {
        (self.page.max(1) - 1).checked_mul(self.per_page)
    }
}

/// Position of a page within the whole result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub page: u64,
    pub per_page: u64,
    pub total: u64,
    pub pages: u64,
}

impl Page {
    pub fn has_next(&self) -> bool {
        self.page < self.pages
    }
    pub fn has_previous(&self) -> bool {
        self.page > 1
    }
}

/// One page of results plus what is needed to render the pagination.
#[derive(Debug)]
pub struct Paginator<T> {
    pub items: MaterializedResultSet<T>,
    pub page: Page,
}

impl<T> Paginator<T> {
    pub fn pages(&self) -> u64 {
        self.page.pages
    }
    pub fn total(&self) -> u64 {
        self.page.total
    }
    pub fn has_next(&self) -> bool {
        self.page.has_next()
    }
    pub fn has_previous(&self) -> bool {
        self.page.has_previous()
    }
}

/// Turns a logical query (statement, ordering, pagination) into the
/// statement to prepare.
pub trait Compiler: Send {
    fn compile(
        &self,
        writer: &dyn SqlWriter,
        query: QueryFragment,
        order_by: Option<&OrderColumns>,
        pager: Option<&Pager>,
    ) -> Result<QueryFragment>;

    /// Page metadata once the total number of rows is known.
    fn paging(&self, pager: &Pager, total: u64) -> Page {
        let pages = if pager.per_page == 0 {
            0
        } else {
            total.div_ceil(pager.per_page)
        };
        Page {
            page: pager.page,
            per_page: pager.per_page,
            total,
            pages,
        }
    }
}

/// Appends `ORDER BY` and `LIMIT/OFFSET` through the writer.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultCompiler;

impl Compiler for DefaultCompiler {
    fn compile(
        &self,
        writer: &dyn SqlWriter,
        query: QueryFragment,
        order_by: Option<&OrderColumns>,
        pager: Option<&Pager>,
    ) -> Result<QueryFragment> {
        if order_by.is_none_or(|v| v.is_empty()) && pager.is_none() {
            return Ok(query);
        }
        let (mut sql, params) = query.into_parts();
        if let Some(order_by) = order_by {
            writer.write_order_by(&mut sql, order_by);
        }
        let mut query = QueryFragment::from_parts(sql, params);
        if let Some(pager) = pager {
            let offset = pager.offset().ok_or_else(|| {
                Error::msg(format!(
                    "Page {} of {} rows each is out of range",
                    pager.page, pager.per_page
                ))
            })?;
            query = query.append_limit_offset(writer, Some(pager.per_page), Some(offset));
        }
        Ok(query)
    }
}

#[cfg(test)]
mod tests {
    use super::{Compiler, DefaultCompiler, Pager};
    use crate::{OrderColumns, QueryFragment, SqlWriter};

    struct Writer;
    impl SqlWriter for Writer {
        fn as_dyn(&self) -> &dyn SqlWriter {
            self
        }
    }

    #[test]
    fn order_and_page() {
        let order = OrderColumns::new([("name", "desc")]).unwrap();
        let query = DefaultCompiler
            .compile(
                &Writer,
                QueryFragment::new("SELECT * FROM t"),
                Some(&order),
                Some(&Pager::new(3, 10)),
            )
            .unwrap();
        assert_eq!(
            query.sql(),
            r#"SELECT * FROM t ORDER BY "name" DESC LIMIT 10 OFFSET 20"#
        );
    }

    #[test]
    fn page_out_of_range() {
        let pager = Pager::new(u64::MAX / 2, 10);
        assert_eq!(pager.offset(), None);
        let error = DefaultCompiler
            .compile(&Writer, QueryFragment::new("SELECT * FROM t"), None, Some(&pager))
            .unwrap_err();
        assert!(error.to_string().contains("out of range"));
        assert_eq!(Pager::new(u64::MAX, 1).offset(), Some(u64::MAX - 1));
    }

    #[test]
    fn pages() {
        let page = DefaultCompiler.paging(&Pager::new(2, 10), 21);
        assert_eq!(page.pages, 3);
        assert!(page.has_next());
        assert!(page.has_previous());
        assert!(!DefaultCompiler.paging(&Pager::new(0, 10), 0).has_previous());
    }
}
