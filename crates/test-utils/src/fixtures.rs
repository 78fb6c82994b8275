// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Test fixtures and sample SQL

/// Sample SQL scripts for testing
///
/// Cursor positions are marked with `█`; see [`crate::split_cursor`].
pub struct SqlFixtures;

impl SqlFixtures {
    // ===== Column contexts =====

    pub const fn select_list() -> &'static str {
        "SELECT █ FROM Employees"
    }

    pub const fn select_qualified() -> &'static str {
        "SELECT e.█ FROM Employees e"
    }

    pub const fn join_on() -> &'static str {
        "SELECT * FROM Employees e JOIN Departments d ON e.█"
    }

    pub const fn update_set() -> &'static str {
        "UPDATE Employees SET █"
    }

    pub const fn undefined_alias() -> &'static str {
        "SELECT x.█ FROM Employees e"
    }

    pub const fn where_comparison() -> &'static str {
        "SELECT * FROM Employees e JOIN Departments d ON d.DepartmentID = █"
    }

    // ===== Table contexts =====

    pub const fn cte_from() -> &'static str {
        "WITH EmpCTE AS (SELECT EmployeeID FROM Employees) SELECT * FROM █"
    }

    pub const fn cte_out_of_scope() -> &'static str {
        "WITH EmpCTE AS (SELECT EmployeeID FROM Employees) SELECT * FROM EmpCTE;\nSELECT * FROM █"
    }

    pub const fn schema_qualified_from() -> &'static str {
        "SELECT * FROM audit.█"
    }

    pub const fn database_qualified_from() -> &'static str {
        "SELECT * FROM Sales.dbo.█"
    }

    // ===== Positional contexts =====

    pub const fn insert_values() -> &'static str {
        "INSERT INTO Employees (EmployeeID, FirstName, LastName) VALUES (1, UPPER('a', 'b'), █"
    }

    pub const fn exec_params() -> &'static str {
        "EXEC dbo.usp_UpdateSalary @EmployeeID = 1, █"
    }

    // ===== Scripts =====

    /// Multi-batch script with USE directives and comments
    pub const fn hr_script() -> &'static str {
        "/* nightly report */\n\
         USE Hr;\n\
         GO\n\
         -- active staff\n\
         SELECT e.FirstName, d.DepartmentName\n\
         FROM dbo.Employees e\n\
         JOIN Departments d ON d.DepartmentID = e.DepartmentID;\n\
         GO\n\
         USE [Sales]\n\
         SELECT * FROM Orders"
    }

    /// Statement with a temp table created earlier in the buffer
    pub const fn temp_table_script() -> &'static str {
        "CREATE TABLE #Raise (EmployeeID INT, Amount MONEY);\n\
         SELECT r.█ FROM #Raise r"
    }
}

/// Sample catalog documents for testing
pub struct SchemaFixtures;

impl SchemaFixtures {
    /// HR catalog used across the workspace's tests
    ///
    /// `Hr` has the `dbo` and `audit` schemas; `Sales` has `dbo`; `master` is empty.
    pub const fn hr_yaml() -> &'static str {
        r#"
dialect: sqlserver
databases:
  - name: Hr
    schemas:
      - name: dbo
        tables:
          - name: Employees
            columns:
              - { name: EmployeeID, type: int, primary_key: true }
              - { name: FirstName, type: nvarchar(50) }
              - { name: LastName, type: nvarchar(50) }
              - { name: Email, type: nvarchar(100) }
              - { name: HireDate, type: date }
              - { name: Salary, type: money }
              - { name: DepartmentID, type: int, references: Departments.DepartmentID }
              - { name: ManagerID, type: int, references: Employees.EmployeeID }
          - name: Departments
            columns:
              - { name: DepartmentID, type: int, primary_key: true }
              - { name: DepartmentName, type: nvarchar(100) }
              - { name: LocationID, type: int, references: Locations.LocationID }
          - name: Locations
            columns:
              - { name: LocationID, type: int, primary_key: true }
              - { name: City, type: nvarchar(60) }
              - { name: Country, type: nvarchar(60) }
          - name: EmployeeArchive
            columns:
              - { name: EmployeeID, type: int }
              - { name: FirstName, type: nvarchar(50) }
              - { name: LastName, type: nvarchar(50) }
              - { name: ArchivedAt, type: datetime2 }
        views:
          - name: vw_ActiveEmployees
            columns:
              - { name: EmployeeID, type: int }
              - { name: FullName, type: nvarchar(101) }
              - { name: DepartmentName, type: nvarchar(100) }
        procedures:
          - name: usp_GetEmployee
            parameters:
              - { name: "@EmployeeID", type: int }
          - name: usp_UpdateSalary
            parameters:
              - { name: "@EmployeeID", type: int }
              - { name: "@NewSalary", type: money }
              - { name: "@Reason", type: nvarchar(200), has_default: true }
              - { name: "@OldSalary", type: money, output: true }
        functions:
          - name: fn_EmployeeTenure
            parameters:
              - { name: "@EmployeeID", type: int }
        synonyms:
          - { name: Staff, target: dbo.Employees }
      - name: audit
        tables:
          - name: ChangeLog
            columns:
              - { name: ChangeID, type: int, primary_key: true }
              - { name: TableName, type: nvarchar(128) }
              - { name: ChangedAt, type: datetime2 }
              - { name: ChangedBy, type: nvarchar(128) }
  - name: Sales
    schemas:
      - name: dbo
        tables:
          - name: Orders
            columns:
              - { name: OrderID, type: int, primary_key: true }
              - { name: CustomerID, type: int, references: Customers.CustomerID }
              - { name: EmployeeID, type: int }
              - { name: OrderDate, type: date }
              - { name: Total, type: decimal(12,2) }
          - name: Customers
            columns:
              - { name: CustomerID, type: int, primary_key: true }
              - { name: CustomerName, type: nvarchar(100) }
  - name: master
"#
    }
}
